//! Plan cache: a `key -> PlanCacheEntry` store with TTL, LRU eviction, and
//! deep-clone-on-read/write semantics (spec §4.2, §6.3).
//!
//! ## Design decisions
//!
//! Entries are cloned on both `get` and `set` so that neither the caller's
//! mutation of a returned entry nor a later internal mutation can leak
//! across the cache boundary (spec invariant 7, spec §9's `clone_plan`
//! note). The in-memory backend additionally partitions its LRU by profile
//! tag internally, so `clear(Some(profile))` is O(entries for that
//! profile) rather than an O(n) scan of the whole cache (SPEC_FULL §11).
//!
//! ### Thread safety
//!
//! Uses `parking_lot::RwLock` for interior mutability: `get`/`set`/`delete`
//! all take the write lock since every one of them mutates hit/miss/sliding
//! TTL bookkeeping; `stats()` takes a read lock.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use lru::LruCache;
use parking_lot::RwLock;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::time::Duration;

use crate::error::{CacheError, Result};
use crate::types::plan::SearchPlan;
use crate::types::ParseDiagnostic;

/// A cache key, derived per spec §4.6: "stable string of (canonical JSON of
/// schema with sorted keys) XOR hash of instructions XOR hash of
/// plan-affecting options XOR profile id. Identical requests for different
/// `inputData` yield the same key." `inputData` never contributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive a key from the schema's canonical (sorted-key) JSON form, the
    /// raw instructions string, a stable string of plan-affecting options,
    /// and the profile tag. `inputData` is never passed in — invariant 2.
    #[must_use]
    pub fn derive(
        schema_canonical_json: &str,
        instructions: Option<&str>,
        plan_affecting_options: &str,
        profile: &str,
    ) -> Self {
        let mut hasher = DefaultHasher::new();
        schema_canonical_json.hash(&mut hasher);
        instructions.unwrap_or("").hash(&mut hasher);
        plan_affecting_options.hash(&mut hasher);
        profile.hash(&mut hasher);
        let digest = hasher.finish();
        Self(format!("{profile}:{digest:016x}"))
    }

    /// Expose the computed hash for callers that want cache identity
    /// without re-deriving it (SPEC_FULL §11).
    #[must_use]
    pub fn compute_hash(&self) -> &str {
        &self.0
    }

    /// The profile tag embedded in this key, used for scoped `clear`.
    #[must_use]
    pub fn profile(&self) -> &str {
        self.0.split_once(':').map_or(self.0.as_str(), |(p, _)| p)
    }
}

/// A stored plan-cache entry (spec §3). Every consumer of a `PlanCache`
/// receives and hands in copies of this type, never references.
#[derive(Debug, Clone)]
pub struct PlanCacheEntry {
    pub key: CacheKey,
    pub plan: SearchPlan,
    pub diagnostics: Vec<ParseDiagnostic>,
    pub confidence: f64,
    pub profile: String,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub stored_at: Option<DateTime<Utc>>,
}

/// Result of applying the cache-entry evaluation policy (spec §4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluatedEntry {
    /// Usable as-is.
    Hit,
    /// Usable, but the orchestrator should schedule an asynchronous refresh.
    Stale,
    /// TTL/`maxAge` exceeded; behaves as a miss.
    Expired,
    /// Failed `minConfidence`; behaves as a miss.
    Rejected,
    /// No entry was present.
    Miss,
}

/// Cache operation counters (spec §4.2), each paired with the timestamp of
/// its most recent occurrence.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub clears: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub last_hit_at: Option<DateTime<Utc>>,
    pub last_miss_at: Option<DateTime<Utc>>,
    pub last_set_at: Option<DateTime<Utc>>,
    pub last_delete_at: Option<DateTime<Utc>>,
    pub last_clear_at: Option<DateTime<Utc>>,
    pub last_eviction_at: Option<DateTime<Utc>>,
    pub last_expiration_at: Option<DateTime<Utc>>,
}

impl CacheStats {
    /// `hits / (hits + misses)`, or `0.0` if there have been no lookups yet.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// The plan-cache collaborator contract (spec §6.3). `get`/`set` MUST
/// return/accept deep copies; `InMemoryPlanCache` below is the reference
/// implementation, but an external provider could implement this trait
/// against a remote store instead (spec §4.2: "two pluggable backends").
pub trait PlanCache: Send + Sync {
    /// Fetch a deep copy of the entry for `key`, if present and not expired.
    fn get(&self, key: &CacheKey) -> Option<PlanCacheEntry>;
    /// Store a deep copy of `entry` under `key`.
    fn set(&self, key: CacheKey, entry: PlanCacheEntry) -> Result<()>;
    /// Remove the entry for `key`, if any.
    fn delete(&self, key: &CacheKey);
    /// Remove all entries, or only those tagged with `profile` if given.
    fn clear(&self, profile: Option<&str>);
    /// A snapshot of current operation counters.
    fn stats(&self) -> CacheStats;

    /// Apply the cache-entry evaluation policy (spec §4.2) to a `get`
    /// result, given the orchestrator's configured thresholds.
    fn evaluate(
        &self,
        key: &CacheKey,
        min_confidence: Option<f64>,
        max_age: Option<Duration>,
        stale_after: Option<Duration>,
    ) -> (EvaluatedEntry, Option<PlanCacheEntry>) {
        let Some(entry) = self.get(key) else {
            return (EvaluatedEntry::Miss, None);
        };

        if let Some(min_confidence) = min_confidence {
            if entry.confidence < min_confidence {
                return (EvaluatedEntry::Rejected, Some(entry));
            }
        }

        let age = Utc::now().signed_duration_since(entry.updated_at);
        if let Some(max_age) = max_age {
            if age > ChronoDuration::from_std(max_age).unwrap_or(ChronoDuration::zero()) {
                return (EvaluatedEntry::Expired, Some(entry));
            }
        }

        if let Some(stale_after) = stale_after {
            if age > ChronoDuration::from_std(stale_after).unwrap_or(ChronoDuration::zero()) {
                return (EvaluatedEntry::Stale, Some(entry));
            }
        }

        (EvaluatedEntry::Hit, Some(entry))
    }
}

struct Slot {
    entry: PlanCacheEntry,
    ttl: Option<Duration>,
}

impl Slot {
    fn is_expired(&self) -> bool {
        match self.ttl {
            Some(ttl) if ttl.is_zero() => false,
            Some(ttl) => {
                let elapsed = Utc::now().signed_duration_since(self.entry.updated_at);
                elapsed > ChronoDuration::from_std(ttl).unwrap_or(ChronoDuration::zero())
            }
            None => false,
        }
    }
}

/// Reference in-memory `PlanCache` implementation: LRU-bounded, TTL-aware,
/// deep-cloning, profile-partitioned for O(1) scoped clears.
pub struct InMemoryPlanCache {
    entries: RwLock<LruCache<CacheKey, Slot>>,
    profile_index: RwLock<HashMap<String, Vec<CacheKey>>>,
    stats: RwLock<CacheStats>,
    ttl: Option<Duration>,
}

impl InMemoryPlanCache {
    /// Build a cache with the given maximum entry count (`None` = unbounded,
    /// implemented as a very large effective capacity since `lru::LruCache`
    /// requires a `NonZeroUsize`) and TTL (`Duration::ZERO` disables
    /// expiration, per spec §8).
    #[must_use]
    pub fn new(max_entries: Option<usize>, ttl: Duration) -> Self {
        let capacity = max_entries
            .and_then(NonZeroUsize::new)
            .unwrap_or_else(|| NonZeroUsize::new(usize::MAX >> 1).unwrap());
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            profile_index: RwLock::new(HashMap::new()),
            stats: RwLock::new(CacheStats::default()),
            ttl: if ttl.is_zero() { None } else { Some(ttl) },
        }
    }

    fn untrack_profile(&self, key: &CacheKey) {
        let mut index = self.profile_index.write();
        if let Some(keys) = index.get_mut(key.profile()) {
            keys.retain(|k| k != key);
        }
    }

    fn track_profile(&self, key: &CacheKey) {
        self.profile_index
            .write()
            .entry(key.profile().to_string())
            .or_default()
            .push(key.clone());
    }

    /// Current number of live (non-expired) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PlanCache for InMemoryPlanCache {
    fn get(&self, key: &CacheKey) -> Option<PlanCacheEntry> {
        let mut entries = self.entries.write();
        let expired = entries.peek(key).is_some_and(Slot::is_expired);
        if expired {
            entries.pop(key);
            drop(entries);
            self.untrack_profile(key);
            let mut stats = self.stats.write();
            stats.expirations += 1;
            stats.last_expiration_at = Some(Utc::now());
            stats.misses += 1;
            stats.last_miss_at = Some(Utc::now());
            return None;
        }

        let result = entries.get_mut(key).map(|slot| {
            // Sliding TTL: refresh updated_at/expires_at on read.
            slot.entry.updated_at = Utc::now();
            slot.entry.expires_at = slot.ttl.map(|ttl| Utc::now() + ChronoDuration::from_std(ttl).unwrap_or(ChronoDuration::zero()));
            slot.entry.clone()
        });
        drop(entries);

        let mut stats = self.stats.write();
        if result.is_some() {
            stats.hits += 1;
            stats.last_hit_at = Some(Utc::now());
        } else {
            stats.misses += 1;
            stats.last_miss_at = Some(Utc::now());
        }
        result
    }

    fn set(&self, key: CacheKey, entry: PlanCacheEntry) -> Result<()> {
        let now = Utc::now();
        let mut stored = entry;
        stored.updated_at = now;
        stored.stored_at = Some(now);
        stored.expires_at = self
            .ttl
            .map(|ttl| now + ChronoDuration::from_std(ttl).unwrap_or(ChronoDuration::zero()));

        let slot = Slot {
            entry: stored,
            ttl: self.ttl,
        };

        let evicted = {
            let mut entries = self.entries.write();
            entries.push(key.clone(), slot)
        };

        self.track_profile(&key);
        if let Some((evicted_key, _)) = evicted {
            if evicted_key != key {
                self.untrack_profile(&evicted_key);
                let mut stats = self.stats.write();
                stats.evictions += 1;
                stats.last_eviction_at = Some(now);
            }
        }

        let mut stats = self.stats.write();
        stats.sets += 1;
        stats.last_set_at = Some(now);
        Ok(())
    }

    fn delete(&self, key: &CacheKey) {
        let removed = self.entries.write().pop(key).is_some();
        if removed {
            self.untrack_profile(key);
            let mut stats = self.stats.write();
            stats.deletes += 1;
            stats.last_delete_at = Some(Utc::now());
        }
    }

    fn clear(&self, profile: Option<&str>) {
        match profile {
            Some(profile) => {
                let keys = self
                    .profile_index
                    .write()
                    .remove(profile)
                    .unwrap_or_default();
                let mut entries = self.entries.write();
                for key in keys {
                    entries.pop(&key);
                }
            }
            None => {
                self.entries.write().clear();
                self.profile_index.write().clear();
            }
        }
        let mut stats = self.stats.write();
        stats.clears += 1;
        stats.last_clear_at = Some(Utc::now());
    }

    fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }
}
