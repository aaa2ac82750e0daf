//! Schema-driven planner-step construction (spec §4.5).

use super::instructions::{guidance_for_field, parse_field_instructions};
use super::validation::infer_validation_type;
use crate::types::context::DetectedSystemContext;
use crate::types::schema::OutputSchema;
use crate::types::plan::SearchStep;

/// Confidence threshold above which a detected context's hint is folded
/// into a field's search instruction (spec §4.5).
pub const CONTEXT_HINT_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Build one `SearchStep` per schema key, in schema (lexical) key order.
#[must_use]
pub fn build_search_steps(
    schema: &OutputSchema,
    instructions: Option<&str>,
    detected_context: Option<&DetectedSystemContext>,
) -> Vec<SearchStep> {
    let field_guidance = instructions
        .map(parse_field_instructions)
        .unwrap_or_default();

    schema
        .iter()
        .map(|(key, descriptor)| {
            let validation_type = descriptor.validation_type;
            let description = descriptor
                .description
                .clone()
                .unwrap_or_else(|| humanize_key(key));

            let mut instruction_parts = vec![format!("Find the value for \"{description}\".")];

            if let Some(context) = detected_context {
                if context.confidence >= CONTEXT_HINT_CONFIDENCE_THRESHOLD
                    && context.id != "generic"
                {
                    instruction_parts.push(format!(
                        "This document is in the {} domain; prefer terminology typical of that domain.",
                        context.label
                    ));
                }
            }

            if let Some(guidance) = guidance_for_field(&field_guidance, key) {
                instruction_parts.push(guidance.to_string());
            }

            SearchStep {
                target_key: key.clone(),
                description,
                search_instruction: instruction_parts.join(" "),
                validation_type,
                is_required: descriptor.is_required,
                fallback_value: descriptor.fallback_value.clone(),
            }
        })
        .collect()
}

/// Humanize a schema key into a description when the caller did not supply
/// one, e.g. `invoice_total` -> `invoice total`. Used as the planner's
/// fallback description; `infer_validation_type` is exposed here too so
/// callers that only have a bare key (no descriptor) can still plan.
#[must_use]
pub fn humanize_key(key: &str) -> String {
    key.replace(['_', '-'], " ")
}

/// Infer a validation type purely from a key name, when no explicit
/// descriptor type is given. Re-exported for callers assembling a schema
/// programmatically.
#[must_use]
pub fn infer_type_for_key(key: &str) -> crate::types::schema::ValidationType {
    infer_validation_type(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::schema::{FieldDescriptor, ValidationType};

    #[test]
    fn builds_one_step_per_schema_key_in_order() {
        let mut schema = OutputSchema::new();
        schema.insert("email".to_string(), FieldDescriptor::new(ValidationType::Email));
        schema.insert("name".to_string(), FieldDescriptor::new(ValidationType::Name));
        let steps = build_search_steps(&schema, None, None);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].target_key, "email");
        assert_eq!(steps[1].target_key, "name");
    }

    #[test]
    fn field_specific_guidance_is_attached() {
        let mut schema = OutputSchema::new();
        schema.insert(
            "customer_name".to_string(),
            FieldDescriptor::new(ValidationType::Name),
        );
        let instructions =
            "Customer Name - Prefer the full legal name from the contact record.";
        let steps = build_search_steps(&schema, Some(instructions), None);
        assert!(steps[0]
            .search_instruction
            .contains("Prefer the full legal name"));
    }

    #[test]
    fn low_confidence_context_is_not_folded_in() {
        let mut schema = OutputSchema::new();
        schema.insert("total".to_string(), FieldDescriptor::new(ValidationType::Currency));
        let context = DetectedSystemContext {
            id: "finance".to_string(),
            label: "Finance".to_string(),
            confidence: 0.4,
            matched_fields: vec![],
            matched_instruction_terms: vec![],
            rationale: vec![],
        };
        let steps = build_search_steps(&schema, None, Some(&context));
        assert!(!steps[0].search_instruction.contains("finance domain"));
    }
}
