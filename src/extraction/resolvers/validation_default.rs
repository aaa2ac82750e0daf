//! Validation-default resolver (spec §4.6, #4): last resort before the
//! lean-LLM fallback. Applies the field's validation-type regex directly to
//! the whole input.

use async_trait::async_trait;

use crate::error::Result;
use crate::extraction::context::ExtractionContext;
use crate::extraction::registry::{FieldResolutionResult, Resolver};
use crate::heuristics::validation::extract_candidate;
use crate::types::schema::ValidationType;
use crate::types::plan::SearchStep;
use crate::types::{ParseDiagnostic, Stage, Value};

pub struct ValidationDefaultResolver;

#[async_trait]
impl Resolver for ValidationDefaultResolver {
    fn name(&self) -> &'static str {
        "validation_default"
    }

    fn supports(&self, _step: &SearchStep, _ctx: &ExtractionContext) -> bool {
        true
    }

    async fn resolve(
        &self,
        step: &SearchStep,
        ctx: &ExtractionContext,
    ) -> Result<Option<FieldResolutionResult>> {
        if step.validation_type == ValidationType::String || step.validation_type == ValidationType::Object {
            if step.is_required {
                ctx.push_diagnostic(ParseDiagnostic::warning(
                    step.target_key.clone(),
                    Stage::Extractor,
                    format!("{} not found", step.target_key),
                ));
            }
            return Ok(None);
        }

        let Some(candidate) = extract_candidate(step.validation_type, ctx.input()) else {
            if step.is_required {
                ctx.push_diagnostic(ParseDiagnostic::warning(
                    step.target_key.clone(),
                    Stage::Extractor,
                    format!("{} not found", step.target_key),
                ));
            }
            return Ok(None);
        };

        Ok(Some(FieldResolutionResult {
            value: Value::String(candidate),
            confidence: step.validation_type.default_confidence_floor(),
            diagnostics: vec![ParseDiagnostic::info(
                step.target_key.clone(),
                Stage::Extractor,
                "Resolved via validation-type scan of the full input".to_string(),
            )],
            resolver_name: self.name().to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::plan::DetectedFormat;

    fn step(key: &str, validation_type: ValidationType, required: bool) -> SearchStep {
        SearchStep {
            target_key: key.to_string(),
            description: key.to_string(),
            search_instruction: String::new(),
            validation_type,
            is_required: required,
            fallback_value: None,
        }
    }

    #[tokio::test]
    async fn resolves_email_anywhere_in_input() {
        let ctx = ExtractionContext::new(
            "Reach out to ada@analytical.engine for details.".to_string(),
            DetectedFormat::Prose,
        );
        let resolver = ValidationDefaultResolver;
        let result = resolver
            .resolve(&step("contact_email", ValidationType::Email, true), &ctx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.value.as_str(), Some("ada@analytical.engine"));
    }

    #[tokio::test]
    async fn missing_required_field_emits_not_found_diagnostic() {
        let ctx = ExtractionContext::new("no phone here".to_string(), DetectedFormat::Prose);
        let resolver = ValidationDefaultResolver;
        let result = resolver
            .resolve(&step("phone_number", ValidationType::Phone, true), &ctx)
            .await
            .unwrap();
        assert!(result.is_none());
        let diagnostics = ctx.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("phone_number not found"));
    }

    #[tokio::test]
    async fn missing_optional_field_emits_no_diagnostic() {
        let ctx = ExtractionContext::new("no phone here".to_string(), DetectedFormat::Prose);
        let resolver = ValidationDefaultResolver;
        let result = resolver
            .resolve(&step("phone_number", ValidationType::Phone, false), &ctx)
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(ctx.take_diagnostics().is_empty());
    }
}
