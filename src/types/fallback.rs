//! `LeanFallbackUsage` (spec §3, §4.6).

use serde::{Deserialize, Serialize};

/// What the lean-LLM fallback resolver did for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackAction {
    /// The client was actually called for this field.
    Invoked,
    /// The value came from another field's `sharedExtractions`.
    Reused,
    /// The fallback was gated off (budget, plan confidence, or disabled).
    Skipped,
}

/// Why a field's fallback path took `action`, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipGate {
    Disabled,
    NotRequired,
    PlanConfidence,
    InvocationBudget,
    TokenBudget,
}

/// Per-field record of the fallback resolver's decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackFieldUsage {
    pub field: String,
    pub action: FallbackAction,
    pub confidence: f64,
    pub tokens: u64,
    pub reason: Option<String>,
    pub gate: Option<SkipGate>,
}

/// Aggregate lean-LLM fallback usage for one parse (spec §3, invariant 6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeanFallbackUsage {
    pub total_invocations: u64,
    pub resolved_fields: u64,
    pub reused_resolutions: u64,
    pub skipped_by_plan_confidence: u64,
    pub skipped_by_limits: u64,
    pub shared_extractions: u64,
    pub total_tokens: u64,
    pub per_field: Vec<FallbackFieldUsage>,
}

impl LeanFallbackUsage {
    /// Record an invocation (the client was actually called).
    pub fn record_invoked(&mut self, field: &str, confidence: f64, tokens: u64, reason: Option<String>) {
        self.total_invocations += 1;
        self.resolved_fields += 1;
        self.total_tokens += tokens;
        self.per_field.push(FallbackFieldUsage {
            field: field.to_string(),
            action: FallbackAction::Invoked,
            confidence,
            tokens,
            reason,
            gate: None,
        });
    }

    /// Record a field resolved opportunistically via another field's
    /// `sharedExtractions` (spec §4.6: counted as `reused`).
    pub fn record_reused(&mut self, field: &str, confidence: f64) {
        self.reused_resolutions += 1;
        self.shared_extractions += 1;
        self.per_field.push(FallbackFieldUsage {
            field: field.to_string(),
            action: FallbackAction::Reused,
            confidence,
            tokens: 0,
            reason: None,
            gate: None,
        });
    }

    /// Record a field that was gated off before any call was attempted.
    pub fn record_skipped(&mut self, field: &str, gate: SkipGate) {
        match gate {
            SkipGate::PlanConfidence => self.skipped_by_plan_confidence += 1,
            SkipGate::InvocationBudget | SkipGate::TokenBudget => self.skipped_by_limits += 1,
            SkipGate::Disabled | SkipGate::NotRequired => {}
        }
        self.per_field.push(FallbackFieldUsage {
            field: field.to_string(),
            action: FallbackAction::Skipped,
            confidence: 0.0,
            tokens: 0,
            reason: None,
            gate: Some(gate),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_and_token_counters_track_records() {
        let mut usage = LeanFallbackUsage::default();
        usage.record_invoked("revenue", 0.7, 40, Some("matched currency pattern".to_string()));
        usage.record_skipped("notes", SkipGate::PlanConfidence);
        assert_eq!(usage.total_invocations, 1);
        assert_eq!(usage.total_tokens, 40);
        assert_eq!(usage.skipped_by_plan_confidence, 1);
        assert_eq!(usage.per_field.len(), 2);
    }
}
