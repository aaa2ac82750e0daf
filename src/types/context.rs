//! `DetectedSystemContext` (spec §3, §4.4).

use serde::{Deserialize, Serialize};

/// The domain context the system-context detector assigned to a parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedSystemContext {
    /// Context id, e.g. `"crm"`, `"finance"`, or `"generic"`.
    pub id: String,
    /// Human label for display.
    pub label: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Schema field names that matched the context's keyword set.
    pub matched_fields: Vec<String>,
    /// Terms from `instructions` that matched.
    pub matched_instruction_terms: Vec<String>,
    /// Human-readable rationale lines, for diagnostics/debugging.
    pub rationale: Vec<String>,
}

impl DetectedSystemContext {
    /// The context returned when no candidate clears the ambiguity/minimum
    /// thresholds (spec §4.4).
    #[must_use]
    pub fn generic() -> Self {
        Self {
            id: "generic".to_string(),
            label: "Generic".to_string(),
            confidence: 0.35,
            matched_fields: Vec::new(),
            matched_instruction_terms: Vec::new(),
            rationale: vec!["no context cleared the ambiguity/minimum-score thresholds".to_string()],
        }
    }
}
