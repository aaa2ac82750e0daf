//! Plan cache: a key→`PlanCacheEntry` store with TTL, LRU eviction, and
//! deep-clone-on-read/write semantics (spec §4.2).

pub mod cache;

pub use cache::{
    CacheKey, CacheStats, EvaluatedEntry, InMemoryPlanCache, PlanCache, PlanCacheEntry,
};
