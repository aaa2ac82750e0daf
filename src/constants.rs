//! Global constants for the extraction engine.
//!
//! Centralizes the magic numbers named explicitly in the spec so scoring
//! formulas read against named values rather than literals scattered
//! through the heuristics/detector/resolver modules.

/// System-context detector scoring weights and thresholds (spec §4.4).
pub mod detector {
    pub const SCHEMA_WEIGHT: f64 = 1.25;
    pub const INSTRUCTION_WEIGHT: f64 = 1.5;
    pub const SAMPLE_WEIGHT: f64 = 1.0;
    pub const HINT_WEIGHT: f64 = 2.5;
    pub const HINT_BOOST: f64 = 1.25;
    pub const AMBIGUITY_DELTA: f64 = 1.0;
    pub const MINIMUM_SCORE: f64 = 1.0;
    pub const CONFIDENCE_FLOOR: f64 = 0.35;
    pub const CONFIDENCE_CEIL: f64 = 0.95;
}

/// Resolver confidence constants (spec §4.6).
pub mod resolver {
    /// JSON-field resolver: fixed confidence on a direct key match.
    pub const JSON_FIELD_CONFIDENCE: f64 = 0.92;

    /// Section resolver: minimum heading/overlap score to consider a section a match.
    pub const SECTION_MIN_SCORE: f64 = 0.3;
    pub const SECTION_CONFIDENCE_BASE: f64 = 0.45;
    pub const SECTION_CONFIDENCE_SCALE: f64 = 0.4;

    /// Loose key-value resolver.
    pub const LOOSE_KV_BASE: f64 = 0.6;
    pub const LOOSE_KV_VALIDATED_BONUS: f64 = 0.18;
    pub const LOOSE_KV_PER_EXTRA_CANDIDATE: f64 = 0.03;
    pub const LOOSE_KV_MAX_EXTRA_CANDIDATES: usize = 2;
    pub const LOOSE_KV_UNVALIDATED_BASE: f64 = 0.5;
    pub const LOOSE_KV_UNVALIDATED_BONUS: f64 = 0.08;

    /// Heuristic: the field-count threshold above which a structured
    /// key-value document is recognised (spec §4.5 format detection).
    pub const MIN_KEY_VALUE_LINES: usize = 2;
}

/// Overall-confidence formula weights (spec §4.6, §9 calibration choice).
pub mod confidence {
    pub const ARCHITECT_WEIGHT: f64 = 0.3;
    pub const EXTRACTOR_WEIGHT: f64 = 0.7;
}

/// Architect token-cost heuristic (spec §4.8).
pub mod architect {
    pub const TOKENS_PER_REQUIRED_FIELD: u64 = 128;
}

/// Request option bounds (spec §6.1).
pub mod limits {
    pub const MAX_DOMAIN_HINTS: usize = 10;
    pub const MAX_DOMAIN_HINT_LEN: usize = 64;
}
