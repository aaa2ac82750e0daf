//! `EngineConfig` and its sub-configs (SPEC_FULL §10.3), modeled on the
//! teacher's `MemoryConfig`/`MemoryConfig::from_env()` convention.

use std::time::Duration;

/// Plan-cache tuning (spec §4.2).
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries before LRU eviction. `None` disables the bound.
    pub max_entries: Option<usize>,
    /// Time-to-live for an entry. `Duration::ZERO` disables expiration (spec §8).
    pub ttl: Duration,
    /// Minimum confidence required to treat a cache hit as `hit` rather than `rejected`.
    pub min_confidence: Option<f64>,
    /// Maximum entry age before a hit is downgraded to `expired`.
    pub max_age: Option<Duration>,
    /// Age past which a hit is downgraded to `stale` (still returned, but
    /// schedules an asynchronous refresh).
    pub stale_after: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: Some(1000),
            ttl: Duration::from_secs(3600),
            min_confidence: None,
            max_age: None,
            stale_after: None,
        }
    }
}

/// System-context detector tuning (spec §4.4).
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub schema_weight: f64,
    pub instruction_weight: f64,
    pub sample_weight: f64,
    pub hint_weight: f64,
    pub hint_boost: f64,
    pub ambiguity_delta: f64,
    pub minimum_score: f64,
    /// Bounded sample length (characters) passed to the detector.
    pub sample_length: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            schema_weight: 1.25,
            instruction_weight: 1.5,
            sample_weight: 1.0,
            hint_weight: 2.5,
            hint_boost: 1.25,
            ambiguity_delta: 1.0,
            minimum_score: 1.0,
            sample_length: 512,
        }
    }
}

/// Architect tuning (spec §4.8).
#[derive(Debug, Clone)]
pub struct ArchitectConfig {
    /// Model-backed rewrite is only attempted below this heuristic confidence.
    pub model_rewrite_threshold: f64,
    /// Token-cost heuristic: cost per required field before the complexity multiplier.
    pub tokens_per_required_field: u64,
    /// Retries applied to the heuristic pass on transient failure (never to
    /// a model-backed rewrite, per spec §4.6 failure semantics).
    pub retries: u32,
}

impl Default for ArchitectConfig {
    fn default() -> Self {
        Self {
            model_rewrite_threshold: 0.6,
            tokens_per_required_field: 128,
            retries: 1,
        }
    }
}

/// The two plausible readings of the planner-confidence gate named in spec
/// §9's first open question. This crate picks `SkipWhenConfident` as the
/// default (see DESIGN.md's Open Question Decisions) but exposes both so
/// both semantics are testable, as the spec requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanConfidenceGateMode {
    /// Skip the fallback when the heuristic plan is already confident
    /// (fallback only fires to rescue a *weak* plan).
    SkipWhenConfident,
    /// Skip the fallback when the heuristic plan is weak (fallback only
    /// fires to refine fields under an already-trusted plan).
    SkipWhenWeak,
}

/// Lean-LLM fallback tuning (spec §4.6).
#[derive(Debug, Clone)]
pub struct FallbackConfig {
    pub enabled: bool,
    pub max_invocations_per_parse: Option<u64>,
    pub max_tokens_per_parse: Option<u64>,
    /// The confidence threshold the gate compares `plannerConfidence` against.
    pub plan_confidence_gate: f64,
    pub gate_mode: PlanConfidenceGateMode,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_invocations_per_parse: Some(10),
            max_tokens_per_parse: Some(2000),
            plan_confidence_gate: 0.86,
            gate_mode: PlanConfidenceGateMode::SkipWhenConfident,
        }
    }
}

/// Extractor tuning (spec §4.9).
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub default_strategy: super::request::Strategy,
    /// Adaptive strategy escalates to parallel once remaining steps exceed this.
    pub adaptive_escalation_threshold: usize,
    /// Weight given to `plannerConfidence` in the overall-confidence formula (spec §4.6).
    pub architect_weight: f64,
    /// Weight given to the mean field confidence in the overall-confidence formula.
    pub extractor_weight: f64,
    /// Bounded concurrency for the parallel/adaptive strategies' task queue.
    pub max_concurrency: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            default_strategy: super::request::Strategy::Sequential,
            adaptive_escalation_threshold: 4,
            architect_weight: 0.3,
            extractor_weight: 0.7,
            max_concurrency: 8,
        }
    }
}

/// Hard input/schema bounds (spec §8 boundary behaviors).
#[derive(Debug, Clone)]
pub struct Limits {
    pub max_input_length: usize,
    pub max_schema_fields: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_input_length: 1_000_000,
            max_schema_fields: 200,
        }
    }
}

/// Top-level engine configuration, analogous to the teacher's `MemoryConfig`.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub cache: CacheConfig,
    pub detector: DetectorConfig,
    pub architect: ArchitectConfig,
    pub fallback: FallbackConfig,
    pub extractor: ExtractorConfig,
    pub limits: Limits,
}

impl EngineConfig {
    /// Load configuration from `EXTRACT_*` environment variables, falling
    /// back to defaults and logging a `tracing::warn!` on an unparseable
    /// value rather than failing — mirrors the teacher's
    /// `MemoryConfig::from_env()` pattern.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("EXTRACT_CACHE_MAX_ENTRIES") {
            match raw.parse::<usize>() {
                Ok(value) => config.cache.max_entries = Some(value),
                Err(_) => tracing::warn!(
                    value = %raw,
                    "invalid EXTRACT_CACHE_MAX_ENTRIES, keeping default"
                ),
            }
        }

        if let Ok(raw) = std::env::var("EXTRACT_CACHE_TTL_SECS") {
            match raw.parse::<u64>() {
                Ok(value) => config.cache.ttl = Duration::from_secs(value),
                Err(_) => tracing::warn!(
                    value = %raw,
                    "invalid EXTRACT_CACHE_TTL_SECS, keeping default"
                ),
            }
        }

        if let Ok(raw) = std::env::var("EXTRACT_FALLBACK_ENABLED") {
            match raw.parse::<bool>() {
                Ok(value) => config.fallback.enabled = value,
                Err(_) => tracing::warn!(
                    value = %raw,
                    "invalid EXTRACT_FALLBACK_ENABLED, keeping default"
                ),
            }
        }

        if let Ok(raw) = std::env::var("EXTRACT_FALLBACK_MAX_INVOCATIONS") {
            match raw.parse::<u64>() {
                Ok(value) => config.fallback.max_invocations_per_parse = Some(value),
                Err(_) => tracing::warn!(
                    value = %raw,
                    "invalid EXTRACT_FALLBACK_MAX_INVOCATIONS, keeping default"
                ),
            }
        }

        if let Ok(raw) = std::env::var("EXTRACT_FALLBACK_MAX_TOKENS") {
            match raw.parse::<u64>() {
                Ok(value) => config.fallback.max_tokens_per_parse = Some(value),
                Err(_) => tracing::warn!(
                    value = %raw,
                    "invalid EXTRACT_FALLBACK_MAX_TOKENS, keeping default"
                ),
            }
        }

        if let Ok(raw) = std::env::var("EXTRACT_MAX_INPUT_LENGTH") {
            match raw.parse::<usize>() {
                Ok(value) => config.limits.max_input_length = value,
                Err(_) => tracing::warn!(
                    value = %raw,
                    "invalid EXTRACT_MAX_INPUT_LENGTH, keeping default"
                ),
            }
        }

        if let Ok(raw) = std::env::var("EXTRACT_MAX_SCHEMA_FIELDS") {
            match raw.parse::<usize>() {
                Ok(value) => config.limits.max_schema_fields = value,
                Err(_) => tracing::warn!(
                    value = %raw,
                    "invalid EXTRACT_MAX_SCHEMA_FIELDS, keeping default"
                ),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn defaults_match_spec_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.detector.schema_weight, 1.25);
        assert_eq!(config.detector.instruction_weight, 1.5);
        assert_eq!(config.detector.sample_weight, 1.0);
        assert_eq!(config.detector.hint_weight, 2.5);
        assert_eq!(config.detector.ambiguity_delta, 1.0);
        assert_eq!(config.extractor.architect_weight, 0.3);
        assert_eq!(config.extractor.extractor_weight, 0.7);
    }

    #[test]
    #[serial]
    fn from_env_reads_overrides_and_warns_on_garbage() {
        std::env::set_var("EXTRACT_CACHE_MAX_ENTRIES", "42");
        std::env::set_var("EXTRACT_FALLBACK_ENABLED", "not-a-bool");
        let config = EngineConfig::from_env();
        assert_eq!(config.cache.max_entries, Some(42));
        assert!(!config.fallback.enabled);
        std::env::remove_var("EXTRACT_CACHE_MAX_ENTRIES");
        std::env::remove_var("EXTRACT_FALLBACK_ENABLED");
    }
}
