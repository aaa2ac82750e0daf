//! Request preprocessors (spec §4.7): pure transforms over a `ParseRequest`
//! that may emit diagnostics or abort the parse.

use crate::error::{Error, Result};
use crate::types::config::Limits;
use crate::types::{ParseDiagnostic, ParseRequest, Stage};

/// A preprocessing step. Implementations mutate `request` in place and may
/// return diagnostics; returning `Err` aborts the parse (spec §7:
/// "fatal if a required preprocessor rejects").
pub trait Preprocessor: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, request: &mut ParseRequest, limits: &Limits) -> Result<Vec<ParseDiagnostic>>;
}

/// Trims leading/trailing whitespace from `input_data`.
pub struct TrimInput;

impl Preprocessor for TrimInput {
    fn name(&self) -> &'static str {
        "trim_input"
    }

    fn apply(&self, request: &mut ParseRequest, _limits: &Limits) -> Result<Vec<ParseDiagnostic>> {
        let trimmed = request.input_data.trim().to_string();
        request.input_data = trimmed;
        Ok(Vec::new())
    }
}

/// Normalises `\r\n` and bare `\r` line endings to `\n`.
pub struct NormalizeLineEndings;

impl Preprocessor for NormalizeLineEndings {
    fn name(&self) -> &'static str {
        "normalize_line_endings"
    }

    fn apply(&self, request: &mut ParseRequest, _limits: &Limits) -> Result<Vec<ParseDiagnostic>> {
        if request.input_data.contains('\r') {
            request.input_data = request.input_data.replace("\r\n", "\n").replace('\r', "\n");
        }
        Ok(Vec::new())
    }
}

/// Strips whitespace from schema keys (re-keying the schema), aborting if
/// the resulting field count exceeds `limits.max_schema_fields`.
pub struct NormalizeSchemaKeys;

impl Preprocessor for NormalizeSchemaKeys {
    fn name(&self) -> &'static str {
        "normalize_schema_keys"
    }

    fn apply(&self, request: &mut ParseRequest, limits: &Limits) -> Result<Vec<ParseDiagnostic>> {
        let mut diagnostics = Vec::new();
        let needs_rekey = request.output_schema.keys().any(|k| k.trim() != k);
        if needs_rekey {
            let rekeyed: crate::types::schema::OutputSchema = request
                .output_schema
                .iter()
                .map(|(k, v)| (k.trim().to_string(), v.clone()))
                .collect();
            request.output_schema = rekeyed;
            diagnostics.push(ParseDiagnostic::info(
                "*",
                Stage::Preprocess,
                "Schema keys were trimmed of surrounding whitespace".to_string(),
            ));
        }

        if request.output_schema.len() > limits.max_schema_fields {
            return Err(Error::Validation {
                code: "SCHEMA_TOO_LARGE",
                message: format!(
                    "schema has {} fields, exceeding the configured maximum of {}",
                    request.output_schema.len(),
                    limits.max_schema_fields
                ),
            });
        }

        Ok(diagnostics)
    }
}

/// Run every default preprocessor in order, short-circuiting on the first
/// `Err` (spec §7).
pub fn run_preprocessors(
    request: &mut ParseRequest,
    limits: &Limits,
) -> Result<Vec<ParseDiagnostic>> {
    let chain: Vec<Box<dyn Preprocessor>> = vec![
        Box::new(TrimInput),
        Box::new(NormalizeLineEndings),
        Box::new(NormalizeSchemaKeys),
    ];

    let mut diagnostics = Vec::new();
    for preprocessor in &chain {
        diagnostics.extend(preprocessor.apply(request, limits)?);
    }
    Ok(diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::schema::{FieldDescriptor, ValidationType};

    fn request(input: &str) -> ParseRequest {
        ParseRequest {
            input_data: input.to_string(),
            output_schema: Default::default(),
            instructions: None,
            options: Default::default(),
        }
    }

    #[test]
    fn trims_and_normalizes_line_endings() {
        let mut req = request("  line one\r\nline two  \r\n");
        let limits = Limits::default();
        run_preprocessors(&mut req, &limits).unwrap();
        assert_eq!(req.input_data, "line one\nline two");
    }

    #[test]
    fn schema_key_whitespace_is_stripped() {
        let mut req = request("x");
        req.output_schema
            .insert(" name ".to_string(), FieldDescriptor::new(ValidationType::String));
        let limits = Limits::default();
        run_preprocessors(&mut req, &limits).unwrap();
        assert!(req.output_schema.contains_key("name"));
    }

    #[test]
    fn schema_too_large_aborts_with_code() {
        let mut req = request("x");
        for i in 0..5 {
            req.output_schema.insert(
                format!("field_{i}"),
                FieldDescriptor::new(ValidationType::String),
            );
        }
        let limits = Limits {
            max_schema_fields: 3,
            ..Limits::default()
        };
        let err = run_preprocessors(&mut req, &limits).unwrap_err();
        assert_eq!(err.code(), Some("SCHEMA_TOO_LARGE"));
    }
}
