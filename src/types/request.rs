//! `ParseRequest` and its `options` bag (spec §3, §6.1).

use serde::{Deserialize, Serialize};

use super::schema::OutputSchema;

/// Extractor execution strategy (spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Sequential,
    Parallel,
    Adaptive,
}

/// Recognised request options (spec §6.1).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParseOptions {
    /// Wall-clock budget in milliseconds; advisory (spec §5).
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Retries applied to the architect on transient failure only.
    #[serde(default)]
    pub retries: Option<u32>,
    /// If true, postprocess verifies value types against the declared
    /// validation type; mismatches become warnings, not errors.
    #[serde(default)]
    pub validate_output: bool,
    /// Overrides the plan's default confidence threshold.
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
    /// Extractor execution strategy.
    #[serde(default)]
    pub strategy: Option<Strategy>,
    /// Profile tag passed to plan-cache keying and the context detector.
    #[serde(default)]
    pub profile: Option<String>,
    /// Up to 10 short strings (≤64 chars each) biasing the context detector.
    #[serde(default)]
    pub domain_hints: Vec<String>,
    /// Explicit context id, bypassing/boosting detector scoring.
    #[serde(default)]
    pub system_context_hint: Option<String>,
}

/// A request to extract `output_schema`-shaped structured data from
/// `input_data` (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseRequest {
    /// Raw unstructured input text.
    pub input_data: String,
    /// Caller-supplied output schema.
    pub output_schema: OutputSchema,
    /// Optional free-form guidance, parsed for per-field instructions (§4.5).
    #[serde(default)]
    pub instructions: Option<String>,
    /// Recognised options.
    #[serde(default)]
    pub options: ParseOptions,
}

impl ParseRequest {
    /// The profile tag, defaulting to `"default"` when the caller did not
    /// supply one. Used uniformly by cache keying and the detector.
    #[must_use]
    pub fn profile(&self) -> &str {
        self.options.profile.as_deref().unwrap_or("default")
    }
}
