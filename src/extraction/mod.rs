//! Resolver registry and the per-parse `ExtractionContext` shared scratch
//! (spec §4.6, §9).
//!
//! Replaces "ad-hoc shared scratch with an explicit `ExtractionContext`
//! struct holding typed caches" per spec §9's re-architecture note. The
//! orchestrator is the sole owner; resolvers receive it by shared
//! reference.

pub mod context;
pub mod registry;
pub mod resolvers;

pub use context::ExtractionContext;
pub use registry::{FieldResolutionResult, Resolver, ResolverRegistry};
