//! `SearchStep` and `SearchPlan` (spec §3, §4.5, §4.8).

use serde::{Deserialize, Serialize};

use super::context::DetectedSystemContext;
use super::request::Strategy;
use super::schema::ValidationType;
use super::value::Value;

/// A single schema key's search instruction set (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchStep {
    /// The schema key this step resolves.
    pub target_key: String,
    /// Human-readable description, surfaced in diagnostics.
    pub description: String,
    /// Natural-language instruction composed by the planner (spec §4.5).
    pub search_instruction: String,
    /// The declared/inferred validation type.
    pub validation_type: ValidationType,
    /// Whether the field must resolve for `success=true`.
    pub is_required: bool,
    /// Substituted value when no resolver produces one.
    #[serde(default)]
    pub fallback_value: Option<Value>,
}

/// Plan complexity bucket, informing `estimated_tokens` and strategy
/// escalation (spec §3, §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    Med,
    High,
}

/// Where a `SearchPlan` came from (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanOrigin {
    Heuristic,
    Model,
    Cached,
    Manual,
}

/// Detected input format, attached to plan metadata (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectedFormat {
    Json,
    Csv,
    KeyValue,
    Prose,
}

/// Metadata attached to a `SearchPlan` (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanMetadata {
    pub detected_format: DetectedFormat,
    pub complexity: Complexity,
    pub estimated_tokens: u64,
    pub origin: PlanOrigin,
    pub planner_confidence: f64,
    #[serde(default)]
    pub detected_context: Option<DetectedSystemContext>,
}

/// An ordered, versioned plan of `SearchStep`s produced by the architect and
/// executed by the extractor (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPlan {
    pub id: String,
    pub version: u32,
    pub steps: Vec<SearchStep>,
    pub strategy: Strategy,
    pub confidence_threshold: f64,
    pub metadata: PlanMetadata,
}

impl SearchPlan {
    /// Deep-clone helper required at every trust boundary the plan crosses
    /// (spec §9: "enforce via a single `clone_plan` helper at the cache
    /// boundary; never rely on callers to clone"). `SearchPlan` derives
    /// `Clone`, so this simply names the intent at call sites.
    #[must_use]
    pub fn clone_plan(&self) -> Self {
        self.clone()
    }

    /// Returns a copy of this plan with `metadata.origin` forced to
    /// `Cached`, per invariant 3: "Cached plans surfaced to callers have
    /// `metadata.origin = \"cached\"`; the stored plan retains its original
    /// origin."
    #[must_use]
    pub fn as_cached(&self) -> Self {
        let mut cloned = self.clone_plan();
        cloned.metadata.origin = PlanOrigin::Cached;
        cloned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> SearchPlan {
        SearchPlan {
            id: "plan-1".to_string(),
            version: 1,
            steps: vec![],
            strategy: Strategy::Sequential,
            confidence_threshold: 0.5,
            metadata: PlanMetadata {
                detected_format: DetectedFormat::Json,
                complexity: Complexity::Low,
                estimated_tokens: 128,
                origin: PlanOrigin::Heuristic,
                planner_confidence: 0.9,
                detected_context: None,
            },
        }
    }

    #[test]
    fn as_cached_does_not_mutate_original_origin() {
        let plan = sample_plan();
        let cached = plan.as_cached();
        assert_eq!(cached.metadata.origin, PlanOrigin::Cached);
        assert_eq!(plan.metadata.origin, PlanOrigin::Heuristic);
    }

    #[test]
    fn clone_plan_mutation_is_isolated() {
        let plan = sample_plan();
        let mut cloned = plan.clone_plan();
        cloned.steps.push(SearchStep {
            target_key: "x".to_string(),
            description: String::new(),
            search_instruction: String::new(),
            validation_type: ValidationType::String,
            is_required: true,
            fallback_value: None,
        });
        assert!(plan.steps.is_empty());
        assert_eq!(cloned.steps.len(), 1);
    }
}
