//! Loose key-value resolver (spec §4.6, #3).

use async_trait::async_trait;

use crate::constants::resolver::{
    LOOSE_KV_BASE, LOOSE_KV_MAX_EXTRA_CANDIDATES, LOOSE_KV_PER_EXTRA_CANDIDATE,
    LOOSE_KV_UNVALIDATED_BASE, LOOSE_KV_UNVALIDATED_BONUS, LOOSE_KV_VALIDATED_BONUS,
};
use crate::error::Result;
use crate::extraction::context::ExtractionContext;
use crate::extraction::registry::{FieldResolutionResult, Resolver};
use crate::heuristics::instructions::normalize_key;
use crate::heuristics::validation::extract_candidate;
use crate::types::plan::SearchStep;
use crate::types::{ParseDiagnostic, Stage, Value};

/// Builds a normalised `key -> [values]` map once per parse from lines
/// matching `key: v`, `key = v`, `key — v`.
pub struct LooseKeyValueResolver;

#[async_trait]
impl Resolver for LooseKeyValueResolver {
    fn name(&self) -> &'static str {
        "loose_key_value"
    }

    fn supports(&self, _step: &SearchStep, _ctx: &ExtractionContext) -> bool {
        true
    }

    async fn resolve(
        &self,
        step: &SearchStep,
        ctx: &ExtractionContext,
    ) -> Result<Option<FieldResolutionResult>> {
        let map = ctx.loose_kv_map();
        let normalized_target = normalize_key(&step.target_key);
        let Some(candidates) = map.get(&normalized_target) else {
            return Ok(None);
        };
        if candidates.is_empty() {
            return Ok(None);
        }

        for candidate in candidates {
            if let Some(validated) = extract_candidate(step.validation_type, candidate) {
                let extra = candidates.len().saturating_sub(1).min(LOOSE_KV_MAX_EXTRA_CANDIDATES);
                let confidence = (LOOSE_KV_BASE
                    + LOOSE_KV_VALIDATED_BONUS
                    + extra as f64 * LOOSE_KV_PER_EXTRA_CANDIDATE)
                    .clamp(0.0, 0.86);
                return Ok(Some(FieldResolutionResult {
                    value: Value::String(validated),
                    confidence,
                    diagnostics: vec![ParseDiagnostic::info(
                        step.target_key.clone(),
                        Stage::Extractor,
                        "Resolved via loose key-value match".to_string(),
                    )],
                    resolver_name: self.name().to_string(),
                }));
            }
        }

        let first = candidates[0].clone();
        let confidence = (LOOSE_KV_UNVALIDATED_BASE + LOOSE_KV_UNVALIDATED_BONUS).clamp(0.0, 1.0);
        Ok(Some(FieldResolutionResult {
            value: Value::String(first),
            confidence,
            diagnostics: vec![ParseDiagnostic::info(
                step.target_key.clone(),
                Stage::Extractor,
                "Resolved via loose key-value match (unvalidated)".to_string(),
            )],
            resolver_name: self.name().to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::plan::DetectedFormat;
    use crate::types::schema::ValidationType;

    fn step(key: &str, validation_type: ValidationType) -> SearchStep {
        SearchStep {
            target_key: key.to_string(),
            description: key.to_string(),
            search_instruction: String::new(),
            validation_type,
            is_required: true,
            fallback_value: None,
        }
    }

    #[tokio::test]
    async fn validated_candidate_gets_higher_confidence() {
        let ctx = ExtractionContext::new(
            "Invoice Total: $1,234.56\nDue Date: 2024-02-01\nNotes: net-30".to_string(),
            DetectedFormat::KeyValue,
        );
        let resolver = LooseKeyValueResolver;
        let result = resolver
            .resolve(&step("invoice_total", ValidationType::Currency), &ctx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.value.as_str(), Some("$1,234.56"));
        assert!(result.confidence > 0.75);
    }

    #[tokio::test]
    async fn unvalidated_candidate_still_resolves_at_lower_confidence() {
        let ctx = ExtractionContext::new("Notes: net-30".to_string(), DetectedFormat::KeyValue);
        let resolver = LooseKeyValueResolver;
        let result = resolver
            .resolve(&step("notes", ValidationType::Email), &ctx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.value.as_str(), Some("net-30"));
        assert!(result.confidence < 0.7);
    }
}
