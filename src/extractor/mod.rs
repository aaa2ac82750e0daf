//! The extractor stage (spec §4.9): executes a `SearchPlan` against the full
//! input via the resolver registry, under sequential, parallel, or adaptive
//! strategy.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::extraction::resolvers::{
    JsonFieldResolver, LeanFallbackResolver, LooseKeyValueResolver, SectionResolver,
    ValidationDefaultResolver,
};
use crate::extraction::{ExtractionContext, FieldResolutionResult, Resolver, ResolverRegistry};
use crate::lean_llm::LeanLlmClient;
use crate::task_queue::{AsyncTaskQueue, QueueConfig};
use crate::types::config::{ExtractorConfig, FallbackConfig};
use crate::types::fallback::LeanFallbackUsage;
use crate::types::plan::{SearchPlan, SearchStep};
use crate::types::request::Strategy;
use crate::types::{ParseDiagnostic, Stage, Value};

/// What running a plan through the extractor produced.
pub struct ExtractorOutput {
    pub parsed_data: BTreeMap<String, Value>,
    pub diagnostics: Vec<ParseDiagnostic>,
    pub confidence: f64,
    pub fallback_usage: LeanFallbackUsage,
    /// `false` only when the plan has at least one required field and none
    /// of them resolved above their confidence floor (spec §4.6).
    pub success: bool,
}

type StepOutcome = (Option<FieldResolutionResult>, Vec<ParseDiagnostic>);

/// Executes `SearchPlan`s against raw input (spec §4.9).
pub struct Extractor {
    config: ExtractorConfig,
    fallback_config: FallbackConfig,
    lean_client: Arc<dyn LeanLlmClient>,
}

impl Extractor {
    #[must_use]
    pub fn new(
        config: ExtractorConfig,
        fallback_config: FallbackConfig,
        lean_client: Arc<dyn LeanLlmClient>,
    ) -> Self {
        Self {
            config,
            fallback_config,
            lean_client,
        }
    }

    fn build_registry(&self, plan: &SearchPlan) -> ResolverRegistry {
        let plan_summary = format!(
            "{} steps, detected format {:?}, complexity {:?}",
            plan.steps.len(),
            plan.metadata.detected_format,
            plan.metadata.complexity
        );
        let resolvers: Vec<Box<dyn Resolver>> = vec![
            Box::new(JsonFieldResolver),
            Box::new(SectionResolver),
            Box::new(LooseKeyValueResolver),
            Box::new(ValidationDefaultResolver),
            Box::new(LeanFallbackResolver::new(
                self.lean_client.clone(),
                self.fallback_config.clone(),
                plan.metadata.planner_confidence,
                Some(plan_summary),
                plan.metadata.detected_context.clone(),
            )),
        ];
        ResolverRegistry::new(resolvers)
    }

    async fn run_sequential(
        ctx: &ExtractionContext,
        registry: &ResolverRegistry,
        steps: &[SearchStep],
    ) -> Vec<StepOutcome> {
        let mut outcomes = Vec::with_capacity(steps.len());
        for step in steps {
            outcomes.push(registry.resolve(step, ctx).await);
        }
        outcomes
    }

    async fn run_parallel(
        &self,
        ctx: Arc<ExtractionContext>,
        registry: Arc<ResolverRegistry>,
        steps: &[SearchStep],
    ) -> Vec<StepOutcome> {
        let queue: AsyncTaskQueue<()> = AsyncTaskQueue::new(QueueConfig {
            max_concurrency: self.config.max_concurrency,
        });
        let slots: Arc<Mutex<Vec<Option<StepOutcome>>>> =
            Arc::new(Mutex::new((0..steps.len()).map(|_| None).collect()));

        for (index, step) in steps.iter().enumerate() {
            let ctx = ctx.clone();
            let registry = registry.clone();
            let step = step.clone();
            let slots = slots.clone();
            queue.enqueue(async move {
                let outcome = registry.resolve(&step, &ctx).await;
                slots.lock()[index] = Some(outcome);
                Ok(())
            });
        }

        queue.on_idle().await;
        Arc::try_unwrap(slots)
            .map(|m| m.into_inner())
            .unwrap_or_else(|arc| arc.lock().clone())
            .into_iter()
            .map(|slot| slot.expect("every enqueued slot is filled before on_idle resolves"))
            .collect()
    }

    /// Run `plan` against `input`, returning parsed data, ordered
    /// diagnostics, overall confidence, and fallback usage.
    pub async fn execute(&self, plan: &SearchPlan, input: &str) -> Result<ExtractorOutput> {
        let ctx = Arc::new(ExtractionContext::new(
            input.to_string(),
            plan.metadata.detected_format,
        ));
        let registry = Arc::new(self.build_registry(plan));

        let outcomes = match plan.strategy {
            Strategy::Sequential => Self::run_sequential(&ctx, &registry, &plan.steps).await,
            Strategy::Parallel => self.run_parallel(ctx.clone(), registry.clone(), &plan.steps).await,
            Strategy::Adaptive => {
                if plan.steps.len() > self.config.adaptive_escalation_threshold {
                    let split = self.config.adaptive_escalation_threshold;
                    let mut outcomes =
                        Self::run_sequential(&ctx, &registry, &plan.steps[..split]).await;
                    outcomes.extend(
                        self.run_parallel(ctx.clone(), registry.clone(), &plan.steps[split..])
                            .await,
                    );
                    outcomes
                } else {
                    Self::run_sequential(&ctx, &registry, &plan.steps).await
                }
            }
        };

        let mut parsed_data = BTreeMap::new();
        let mut diagnostics = Vec::new();
        let mut required_confidences = Vec::new();
        let mut any_required_resolved = false;
        let mut has_required = false;

        for (step, (resolution, step_diagnostics)) in plan.steps.iter().zip(outcomes) {
            diagnostics.extend(step_diagnostics);

            let (value, confidence) = match resolution {
                Some(result) => (result.value, result.confidence.clamp(0.0, 1.0)),
                None => {
                    if let Some(fallback) = &step.fallback_value {
                        diagnostics.push(ParseDiagnostic::info(
                            step.target_key.clone(),
                            Stage::Extractor,
                            "Used the configured fallback value".to_string(),
                        ));
                        (fallback.clone(), step.validation_type.default_confidence_floor())
                    } else {
                        (Value::Null, 0.0)
                    }
                }
            };

            if step.is_required {
                has_required = true;
                required_confidences.push(confidence);
                if !value.is_null() && confidence >= step.validation_type.default_confidence_floor() {
                    any_required_resolved = true;
                }
            }

            parsed_data.insert(step.target_key.clone(), value);
        }

        let mean_required_confidence = if required_confidences.is_empty() {
            1.0
        } else {
            required_confidences.iter().sum::<f64>() / required_confidences.len() as f64
        };

        let confidence = (self.config.architect_weight * plan.metadata.planner_confidence
            + self.config.extractor_weight * mean_required_confidence)
            .clamp(0.0, 1.0);

        let success = !has_required || any_required_resolved;

        Ok(ExtractorOutput {
            parsed_data,
            diagnostics,
            confidence,
            fallback_usage: ctx.fallback_usage(),
            success,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lean_llm::NullLeanLlmClient;
    use crate::types::plan::{Complexity, DetectedFormat, PlanMetadata, PlanOrigin};
    use crate::types::schema::ValidationType;

    fn extractor() -> Extractor {
        Extractor::new(
            ExtractorConfig::default(),
            FallbackConfig::default(),
            Arc::new(NullLeanLlmClient),
        )
    }

    fn plan_with(steps: Vec<SearchStep>, format: DetectedFormat, strategy: Strategy) -> SearchPlan {
        SearchPlan {
            id: "p".to_string(),
            version: 1,
            steps,
            strategy,
            confidence_threshold: 0.5,
            metadata: PlanMetadata {
                detected_format: format,
                complexity: Complexity::Low,
                estimated_tokens: 0,
                origin: PlanOrigin::Heuristic,
                planner_confidence: 0.8,
                detected_context: None,
            },
        }
    }

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
    async fn json_happy_path_resolves_both_fields() {
        let plan = plan_with(
            vec![step("name", ValidationType::Name), step("email", ValidationType::Email)],
            DetectedFormat::Json,
            Strategy::Sequential,
        );
        let input = r#"{"Name":"Ada Lovelace","Email":"ada@analytical.engine"}"#;
        let output = extractor().execute(&plan, input).await.unwrap();
        assert_eq!(
            output.parsed_data.get("name").and_then(Value::as_str),
            Some("Ada Lovelace")
        );
        assert!(output.success);
        assert!(output.confidence >= 0.85);
    }

    #[tokio::test]
    async fn missing_required_field_yields_failure() {
        let plan = plan_with(vec![step("revenue", ValidationType::Currency)], DetectedFormat::Prose, Strategy::Sequential);
        let output = extractor()
            .execute(&plan, "Projected uplift roughly thirty to forty percent YoY")
            .await
            .unwrap();
        assert!(!output.success);
        assert!(output.parsed_data.get("revenue").unwrap().is_null());
        assert!(diagnostics_contain(&output.diagnostics, "revenue not found"));
    }

    #[tokio::test]
    async fn parallel_strategy_preserves_plan_order_in_diagnostics() {
        let steps = vec![
            step("a", ValidationType::String),
            step("b", ValidationType::String),
            step("c", ValidationType::String),
        ];
        let plan = plan_with(steps, DetectedFormat::Prose, Strategy::Parallel);
        let output = extractor().execute(&plan, "a: 1\nb: 2\nc: 3").await.unwrap();
        assert_eq!(output.parsed_data.len(), 3);
    }

    fn diagnostics_contain(diagnostics: &[ParseDiagnostic], needle: &str) -> bool {
        diagnostics.iter().any(|d| d.message.contains(needle))
    }
}
