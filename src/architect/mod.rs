//! The architect stage (spec §4.8): produces a `SearchPlan` deterministically
//! from schema + heuristics, with an optional model-backed rewrite hook.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::heuristics::planner::build_search_steps;
use crate::retry::{RetryConfig, RetryPolicy};
use crate::types::config::ArchitectConfig;
use crate::types::context::DetectedSystemContext;
use crate::types::plan::{Complexity, DetectedFormat, PlanMetadata, PlanOrigin, SearchPlan};
use crate::types::request::ParseRequest;
use crate::types::schema::OutputSchema;
use crate::types::{ParseDiagnostic, Stage};

/// What a `PlanRewriteClient` receives (spec §4.8): the heuristic plan plus
/// enough request context to judge whether a revision is warranted.
#[derive(Debug, Clone)]
pub struct PlanRewriteRequest {
    pub heuristic_plan: SearchPlan,
    pub schema: OutputSchema,
    pub instructions: Option<String>,
    pub sample: String,
    pub detected_context: Option<DetectedSystemContext>,
}

/// The external model-backed planner collaborator (spec §4.8). Not part of
/// spec §6's enumerated external interfaces, but follows the same "fallible,
/// never fatal on its own" shape as the lean-LLM client.
#[async_trait]
pub trait PlanRewriteClient: Send + Sync {
    async fn rewrite_plan(&self, request: PlanRewriteRequest) -> std::result::Result<SearchPlan, anyhow::Error>;
}

/// A test double that always declines to rewrite (degrades to the heuristic
/// plan), mirroring `NullLeanLlmClient`.
pub struct NullPlanRewriteClient;

#[async_trait]
impl PlanRewriteClient for NullPlanRewriteClient {
    async fn rewrite_plan(&self, request: PlanRewriteRequest) -> std::result::Result<SearchPlan, anyhow::Error> {
        Ok(request.heuristic_plan)
    }
}

/// Produces `SearchPlan`s from normalised requests (spec §4.8).
pub struct Architect {
    config: ArchitectConfig,
    rewriter: Option<Arc<dyn PlanRewriteClient>>,
}

fn complexity_for(schema: &OutputSchema) -> Complexity {
    match schema.len() {
        0..=3 => Complexity::Low,
        4..=8 => Complexity::Med,
        _ => Complexity::High,
    }
}

fn complexity_multiplier(complexity: Complexity) -> u64 {
    match complexity {
        Complexity::Low => 1,
        Complexity::Med => 2,
        Complexity::High => 3,
    }
}

fn estimate_tokens(schema: &OutputSchema, complexity: Complexity, config: &ArchitectConfig) -> u64 {
    let required_fields = schema.values().filter(|d| d.is_required).count() as u64;
    required_fields * config.tokens_per_required_field * complexity_multiplier(complexity)
}

/// Heuristic confidence in the produced plan: starts from the fraction of
/// fields with an explicit (caller-supplied) description, then folds in the
/// detected-context confidence when a non-generic context was found.
fn heuristic_confidence(schema: &OutputSchema, detected_context: Option<&DetectedSystemContext>) -> f64 {
    if schema.is_empty() {
        return 0.0;
    }
    let described = schema.values().filter(|d| d.description.is_some()).count() as f64;
    let base = 0.5 + 0.3 * (described / schema.len() as f64);
    let context_bonus = detected_context
        .filter(|c| c.id != "generic")
        .map(|c| 0.15 * c.confidence)
        .unwrap_or(0.0);
    (base + context_bonus).clamp(0.0, 0.97)
}

impl Architect {
    #[must_use]
    pub fn new(config: ArchitectConfig) -> Self {
        Self { config, rewriter: None }
    }

    #[must_use]
    pub fn with_rewriter(mut self, rewriter: Arc<dyn PlanRewriteClient>) -> Self {
        self.rewriter = Some(rewriter);
        self
    }

    fn build_heuristic_plan(
        &self,
        request: &ParseRequest,
        format: DetectedFormat,
        detected_context: Option<&DetectedSystemContext>,
    ) -> Result<SearchPlan> {
        if request.output_schema.is_empty() {
            return Err(Error::Architect(
                "cannot build a search plan from an empty schema".to_string(),
            ));
        }

        let steps = build_search_steps(
            &request.output_schema,
            request.instructions.as_deref(),
            detected_context,
        );
        let complexity = complexity_for(&request.output_schema);
        let estimated_tokens = estimate_tokens(&request.output_schema, complexity, &self.config);
        let planner_confidence = heuristic_confidence(&request.output_schema, detected_context);

        Ok(SearchPlan {
            id: Uuid::new_v4().to_string(),
            version: 1,
            steps,
            strategy: request.options.strategy.unwrap_or_default(),
            confidence_threshold: request.options.confidence_threshold.unwrap_or(0.5),
            metadata: PlanMetadata {
                detected_format: format,
                complexity,
                estimated_tokens,
                origin: PlanOrigin::Heuristic,
                planner_confidence,
                detected_context: detected_context.cloned(),
            },
        })
    }

    /// Produce a plan for `request`, attempting a model-backed rewrite when
    /// the heuristic plan's confidence is below `model_rewrite_threshold`
    /// and a rewriter is configured. Rewrite failures degrade to the
    /// heuristic plan plus a warning diagnostic (spec §4.8, §7); the
    /// heuristic pass itself is retried via `RetryPolicy` on transient
    /// failure, but the rewrite call is never retried.
    pub async fn plan(
        &self,
        request: &ParseRequest,
        format: DetectedFormat,
        detected_context: Option<&DetectedSystemContext>,
    ) -> Result<(SearchPlan, Vec<ParseDiagnostic>)> {
        let mut diagnostics = Vec::new();

        let mut retry = RetryPolicy::with_config(RetryConfig {
            max_retries: self.config.retries,
            ..RetryConfig::default()
        });
        let heuristic_plan = retry
            .execute(|| async { self.build_heuristic_plan(request, format, detected_context) })
            .await?;

        if heuristic_plan.metadata.planner_confidence >= self.config.model_rewrite_threshold {
            return Ok((heuristic_plan, diagnostics));
        }

        let Some(rewriter) = &self.rewriter else {
            return Ok((heuristic_plan, diagnostics));
        };

        let rewrite_request = PlanRewriteRequest {
            heuristic_plan: heuristic_plan.clone_plan(),
            schema: request.output_schema.clone(),
            instructions: request.instructions.clone(),
            sample: request.input_data.chars().take(512).collect(),
            detected_context: detected_context.cloned(),
        };

        match rewriter.rewrite_plan(rewrite_request).await {
            Ok(mut revised) => {
                revised.metadata.origin = PlanOrigin::Model;
                Ok((revised, diagnostics))
            }
            Err(err) => {
                diagnostics.push(ParseDiagnostic::warning(
                    "*",
                    Stage::Architect,
                    format!("model-backed plan rewrite failed, keeping heuristic plan: {err}"),
                ));
                Ok((heuristic_plan, diagnostics))
            }
        }
    }
}

/// The placeholder plan used when validation fails before a plan can be
/// built (spec §4.6 failure semantics): one step per schema key, each
/// carrying a fixed search instruction.
#[must_use]
pub fn placeholder_plan(schema: &OutputSchema, strategy: crate::types::request::Strategy) -> SearchPlan {
    use crate::types::plan::SearchStep;

    let steps = schema
        .iter()
        .map(|(key, descriptor)| SearchStep {
            target_key: key.clone(),
            description: descriptor.description.clone().unwrap_or_else(|| key.clone()),
            search_instruction: "No plan generated due to upstream validation error.".to_string(),
            validation_type: descriptor.validation_type,
            is_required: descriptor.is_required,
            fallback_value: descriptor.fallback_value.clone(),
        })
        .collect();

    SearchPlan {
        id: Uuid::new_v4().to_string(),
        version: 1,
        steps,
        strategy,
        confidence_threshold: 0.0,
        metadata: PlanMetadata {
            detected_format: DetectedFormat::Prose,
            complexity: Complexity::Low,
            estimated_tokens: 0,
            origin: PlanOrigin::Manual,
            planner_confidence: 0.0,
            detected_context: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::schema::{FieldDescriptor, ValidationType};

    fn schema_with(n: usize) -> OutputSchema {
        let mut schema = OutputSchema::new();
        for i in 0..n {
            schema.insert(format!("field_{i}"), FieldDescriptor::new(ValidationType::String));
        }
        schema
    }

    fn request(schema: OutputSchema) -> ParseRequest {
        ParseRequest {
            input_data: "some input".to_string(),
            output_schema: schema,
            instructions: None,
            options: Default::default(),
        }
    }

    #[tokio::test]
    async fn heuristic_plan_has_one_step_per_field() {
        let architect = Architect::new(ArchitectConfig::default());
        let req = request(schema_with(3));
        let (plan, diagnostics) = architect
            .plan(&req, DetectedFormat::Prose, None)
            .await
            .unwrap();
        assert_eq!(plan.steps.len(), 3);
        assert_eq!(plan.metadata.origin, PlanOrigin::Heuristic);
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn empty_schema_is_an_architect_error() {
        let architect = Architect::new(ArchitectConfig {
            retries: 0,
            ..ArchitectConfig::default()
        });
        let req = request(OutputSchema::new());
        let result = architect.plan(&req, DetectedFormat::Prose, None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn low_confidence_plan_is_rewritten_when_rewriter_configured() {
        struct Rewriter;
        #[async_trait]
        impl PlanRewriteClient for Rewriter {
            async fn rewrite_plan(
                &self,
                request: PlanRewriteRequest,
            ) -> std::result::Result<SearchPlan, anyhow::Error> {
                Ok(request.heuristic_plan)
            }
        }

        let architect = Architect::new(ArchitectConfig {
            model_rewrite_threshold: 0.99,
            ..ArchitectConfig::default()
        })
        .with_rewriter(Arc::new(Rewriter));

        let req = request(schema_with(1));
        let (plan, _diagnostics) = architect
            .plan(&req, DetectedFormat::Prose, None)
            .await
            .unwrap();
        assert_eq!(plan.metadata.origin, PlanOrigin::Model);
    }

    #[test]
    fn placeholder_plan_has_fixed_instruction_per_field() {
        let schema = schema_with(2);
        let plan = placeholder_plan(&schema, crate::types::request::Strategy::Sequential);
        assert_eq!(plan.steps.len(), 2);
        assert!(plan.steps[0]
            .search_instruction
            .contains("No plan generated"));
    }
}
