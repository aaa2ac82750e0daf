//! JSON-field resolver (spec §4.6, #1).

use async_trait::async_trait;

use crate::constants::resolver::JSON_FIELD_CONFIDENCE;
use crate::error::Result;
use crate::extraction::context::ExtractionContext;
use crate::extraction::registry::{FieldResolutionResult, Resolver};
use crate::heuristics::instructions::normalize_key;
use crate::types::plan::{DetectedFormat, SearchStep};
use crate::types::{ParseDiagnostic, Stage, Value};

/// If `format == Json`, parses the input once (cached in
/// `ExtractionContext`) and does a breadth-first key search comparing
/// normalised forms of `targetKey` against every object key.
pub struct JsonFieldResolver;

fn find_breadth_first(value: &serde_json::Value, normalized_target: &str) -> Option<(Vec<String>, serde_json::Value)> {
    let mut queue: std::collections::VecDeque<(Vec<String>, &serde_json::Value)> =
        std::collections::VecDeque::new();
    queue.push_back((Vec::new(), value));

    while let Some((path, node)) = queue.pop_front() {
        if let serde_json::Value::Object(map) = node {
            for (key, child) in map {
                let mut child_path = path.clone();
                child_path.push(key.clone());
                if normalize_key(key) == normalized_target {
                    return Some((child_path, child.clone()));
                }
                queue.push_back((child_path, child));
            }
        }
    }
    None
}

#[async_trait]
impl Resolver for JsonFieldResolver {
    fn name(&self) -> &'static str {
        "json_field"
    }

    fn supports(&self, _step: &SearchStep, ctx: &ExtractionContext) -> bool {
        ctx.format() == DetectedFormat::Json
    }

    async fn resolve(
        &self,
        step: &SearchStep,
        ctx: &ExtractionContext,
    ) -> Result<Option<FieldResolutionResult>> {
        let Some(payload) = ctx.json_payload() else {
            return Ok(None);
        };

        let normalized_target = normalize_key(&step.target_key);
        let Some((path, found)) = find_breadth_first(&payload, &normalized_target) else {
            return Ok(None);
        };

        Ok(Some(FieldResolutionResult {
            value: Value::from_json(&found),
            confidence: JSON_FIELD_CONFIDENCE,
            diagnostics: vec![ParseDiagnostic::info(
                step.target_key.clone(),
                Stage::Extractor,
                format!("Resolved via JSON path {}", path.join(".")),
            )],
            resolver_name: self.name().to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::schema::ValidationType;

    fn step(key: &str) -> SearchStep {
        SearchStep {
            target_key: key.to_string(),
            description: key.to_string(),
            search_instruction: String::new(),
            validation_type: ValidationType::String,
            is_required: true,
            fallback_value: None,
        }
    }

    #[tokio::test]
    async fn resolves_a_case_insensitive_json_key() {
        let ctx = ExtractionContext::new(
            r#"{"Name":"Ada Lovelace","Email":"ada@analytical.engine"}"#.to_string(),
            DetectedFormat::Json,
        );
        let resolver = JsonFieldResolver;
        let result = resolver.resolve(&step("name"), &ctx).await.unwrap().unwrap();
        assert_eq!(result.value.as_str(), Some("Ada Lovelace"));
        assert_eq!(result.confidence, JSON_FIELD_CONFIDENCE);
        assert!(result.diagnostics[0].message.contains("Name"));
    }

    #[tokio::test]
    async fn returns_none_when_key_is_absent() {
        let ctx = ExtractionContext::new(r#"{"a":1}"#.to_string(), DetectedFormat::Json);
        let resolver = JsonFieldResolver;
        let result = resolver.resolve(&step("b"), &ctx).await.unwrap();
        assert!(result.is_none());
    }
}
