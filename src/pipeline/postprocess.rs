//! Response postprocessors (spec §4.7): transforms over `(parsedData,
//! diagnostics)` that run after extraction.

use std::collections::BTreeMap;

use crate::heuristics::validation::extract_candidate;
use crate::types::schema::{OutputSchema, ValidationType};
use crate::types::{ParseDiagnostic, Stage, Value};

/// Types with no dedicated regex primitive (spec §4.5): postprocessing
/// cannot second-guess a resolver's output for these, so it skips them.
fn has_dedicated_pattern(validation_type: ValidationType) -> bool {
    !matches!(
        validation_type,
        ValidationType::String
            | ValidationType::StringArray
            | ValidationType::NumberArray
            | ValidationType::Object
            | ValidationType::Custom
    )
}

/// A postprocessing step over the assembled `parsedData`.
pub trait Postprocessor: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(
        &self,
        parsed_data: &BTreeMap<String, Value>,
        schema: &OutputSchema,
    ) -> Vec<ParseDiagnostic>;
}

/// When `validateOutput` is set, checks each resolved value still matches
/// its declared validation type; mismatches become warnings, never errors
/// (spec §6.1, §4.7).
pub struct ValidateOutputTypes;

impl Postprocessor for ValidateOutputTypes {
    fn name(&self) -> &'static str {
        "validate_output_types"
    }

    fn apply(
        &self,
        parsed_data: &BTreeMap<String, Value>,
        schema: &OutputSchema,
    ) -> Vec<ParseDiagnostic> {
        let mut diagnostics = Vec::new();
        for (key, descriptor) in schema {
            if !has_dedicated_pattern(descriptor.validation_type) {
                continue;
            }
            let Some(value) = parsed_data.get(key) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let Some(text) = value.as_str() else {
                continue;
            };
            if extract_candidate(descriptor.validation_type, text).is_none() {
                diagnostics.push(ParseDiagnostic::warning(
                    key.clone(),
                    Stage::Postprocess,
                    format!(
                        "value for \"{key}\" does not match the declared validation type {:?}",
                        descriptor.validation_type
                    ),
                ));
            }
        }
        diagnostics
    }
}

/// Run the postprocessor chain. `validate_output` gates `ValidateOutputTypes`.
pub fn run_postprocessors(
    parsed_data: &BTreeMap<String, Value>,
    schema: &OutputSchema,
    validate_output: bool,
) -> Vec<ParseDiagnostic> {
    if !validate_output {
        return Vec::new();
    }
    ValidateOutputTypes.apply(parsed_data, schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::schema::{FieldDescriptor, ValidationType};

    #[test]
    fn mismatched_type_emits_warning_not_error() {
        let mut schema = OutputSchema::new();
        schema.insert("email".to_string(), FieldDescriptor::new(ValidationType::Email));
        let mut parsed = BTreeMap::new();
        parsed.insert("email".to_string(), Value::String("not-an-email".to_string()));

        let diagnostics = run_postprocessors(&parsed, &schema, true);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, crate::types::diagnostic::Severity::Warning);
    }

    #[test]
    fn validation_skipped_when_option_disabled() {
        let mut schema = OutputSchema::new();
        schema.insert("email".to_string(), FieldDescriptor::new(ValidationType::Email));
        let mut parsed = BTreeMap::new();
        parsed.insert("email".to_string(), Value::String("not-an-email".to_string()));

        let diagnostics = run_postprocessors(&parsed, &schema, false);
        assert!(diagnostics.is_empty());
    }
}
