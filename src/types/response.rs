//! `ParseResponse` (spec §3, §6.2).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::diagnostic::ParseDiagnostic;
use super::fallback::LeanFallbackUsage;
use super::plan::SearchPlan;
use super::value::Value;

/// Per-stage timing breakdown (spec §6.2).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageBreakdown {
    #[serde(default)]
    pub preprocess_ms: Option<u64>,
    pub architect_ms: u64,
    pub extractor_ms: u64,
    #[serde(default)]
    pub postprocess_ms: Option<u64>,
}

/// The failure stage recorded in `ParseResponse.error` when `success=false`
/// (spec §6.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Validation,
    Preprocess,
    Architect,
    Extractor,
    Postprocess,
    Orchestration,
}

/// Error detail attached to a failed `ParseResponse`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseError {
    pub stage: FailureStage,
    pub message: String,
    /// Stable machine-readable code for boundary failures (spec §8), e.g.
    /// `EMPTY_INPUT_DATA`, `INPUT_TOO_LARGE`, `SCHEMA_TOO_LARGE`,
    /// `INVALID_INSTRUCTIONS`.
    #[serde(default)]
    pub code: Option<String>,
}

/// Metadata attached to every `ParseResponse` (spec §6.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub plan: SearchPlan,
    pub confidence: f64,
    pub tokens_used: u64,
    pub processing_time_ms: u64,
    pub architect_tokens: u64,
    pub extractor_tokens: u64,
    pub request_id: String,
    pub timestamp: String,
    pub diagnostics: Vec<ParseDiagnostic>,
    pub stage_breakdown: StageBreakdown,
    #[serde(default)]
    pub fallback: Option<LeanFallbackUsage>,
}

/// The top-level response returned to callers (spec §3, §6.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResponse {
    pub success: bool,
    pub parsed_data: BTreeMap<String, Value>,
    pub metadata: ResponseMetadata,
    #[serde(default)]
    pub error: Option<ParseError>,
}

impl ParseResponse {
    /// All non-negative-clamped counters in `metadata` (spec §4.11: "clamp
    /// all tokens/time counters to non-negative integers"). Counters are
    /// `u64` already, so this exists purely to document the invariant at
    /// the assembly call site rather than perform any runtime work.
    pub fn clamp_counters(&mut self) {
        // u64 fields cannot go negative; kept as a no-op marker so the
        // orchestrator's assembly step has an explicit place to call this
        // per spec §4.11, and so a future widening to signed counters has
        // one place to add the clamp.
        let _ = &self.metadata;
    }
}
