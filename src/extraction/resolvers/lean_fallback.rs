//! Lean-LLM fallback resolver (spec §4.6, #5; spec §6.4).
//!
//! Last resolver in the chain. Gated by whether the fallback is enabled,
//! whether the step is required (or fallback-for-optional is allowed by the
//! caller), the plan-confidence gate, and the per-parse invocation/token
//! budget. A client failure is degraded to "no value" plus a diagnostic —
//! it never propagates past this resolver's boundary (spec §7).

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::extraction::context::ExtractionContext;
use crate::extraction::registry::{FieldResolutionResult, Resolver};
use crate::lean_llm::{LeanLlmClient, LeanLlmRequest};
use crate::types::config::{FallbackConfig, PlanConfidenceGateMode};
use crate::types::context::DetectedSystemContext;
use crate::types::fallback::SkipGate;
use crate::types::plan::SearchStep;
use crate::types::{ParseDiagnostic, Stage, Value};

pub struct LeanFallbackResolver {
    client: Arc<dyn LeanLlmClient>,
    config: FallbackConfig,
    planner_confidence: f64,
    plan_summary: Option<String>,
    detected_context: Option<DetectedSystemContext>,
}

impl LeanFallbackResolver {
    #[must_use]
    pub fn new(
        client: Arc<dyn LeanLlmClient>,
        config: FallbackConfig,
        planner_confidence: f64,
        plan_summary: Option<String>,
        detected_context: Option<DetectedSystemContext>,
    ) -> Self {
        Self {
            client,
            config,
            planner_confidence,
            plan_summary,
            detected_context,
        }
    }

    fn gated_by_plan_confidence(&self) -> bool {
        match self.config.gate_mode {
            PlanConfidenceGateMode::SkipWhenConfident => {
                self.planner_confidence >= self.config.plan_confidence_gate
            }
            PlanConfidenceGateMode::SkipWhenWeak => {
                self.planner_confidence < self.config.plan_confidence_gate
            }
        }
    }
}

#[async_trait]
impl Resolver for LeanFallbackResolver {
    fn name(&self) -> &'static str {
        "lean_fallback"
    }

    fn supports(&self, _step: &SearchStep, _ctx: &ExtractionContext) -> bool {
        self.config.enabled
    }

    async fn resolve(
        &self,
        step: &SearchStep,
        ctx: &ExtractionContext,
    ) -> Result<Option<FieldResolutionResult>> {
        if !self.config.enabled {
            return Ok(None);
        }

        if let Some(shared) = ctx.take_shared_extraction(&step.target_key) {
            ctx.record_fallback(|usage| usage.record_reused(&step.target_key, 0.6));
            return Ok(Some(FieldResolutionResult {
                value: shared,
                confidence: 0.6,
                diagnostics: vec![ParseDiagnostic::info(
                    step.target_key.clone(),
                    Stage::Extractor,
                    "Resolved via a prior lean-LLM call's shared extraction".to_string(),
                )],
                resolver_name: self.name().to_string(),
            }));
        }

        if !step.is_required {
            ctx.record_fallback(|usage| usage.record_skipped(&step.target_key, SkipGate::NotRequired));
            return Ok(None);
        }

        if self.gated_by_plan_confidence() {
            ctx.record_fallback(|usage| {
                usage.record_skipped(&step.target_key, SkipGate::PlanConfidence);
            });
            return Ok(None);
        }

        const ESTIMATED_TOKENS: u64 = 150;
        if !ctx.try_reserve_fallback_budget(
            self.config.max_invocations_per_parse,
            self.config.max_tokens_per_parse,
            ESTIMATED_TOKENS,
        ) {
            ctx.record_fallback(|usage| {
                usage.record_skipped(&step.target_key, SkipGate::InvocationBudget);
            });
            return Ok(None);
        }

        let request = LeanLlmRequest {
            field: step.target_key.clone(),
            description: step.description.clone(),
            validation_type: step.validation_type,
            instruction: step.search_instruction.clone(),
            input: ctx.input().to_string(),
            plan_summary: self.plan_summary.clone(),
            detected_context: self.detected_context.clone(),
        };

        let response = match self.client.extract_field(request).await {
            Ok(response) => response,
            Err(err) => {
                if ctx.mark_resolver_error() {
                    ctx.push_diagnostic(ParseDiagnostic::warning(
                        step.target_key.clone(),
                        Stage::Extractor,
                        format!("lean-LLM fallback degraded: {err}"),
                    ));
                }
                return Ok(None);
            }
        };

        for (field, value) in &response.shared_extractions {
            ctx.offer_shared_extraction(field, value.clone());
        }

        let Some(value) = response.value else {
            ctx.record_fallback(|usage| {
                usage.record_invoked(&step.target_key, 0.0, response.tokens_used.unwrap_or(0), response.reason.clone())
            });
            return Ok(None);
        };

        let confidence = response.confidence.unwrap_or(0.5);
        let tokens = response.tokens_used.unwrap_or(0);
        ctx.record_fallback(|usage| {
            usage.record_invoked(&step.target_key, confidence, tokens, response.reason.clone())
        });

        Ok(Some(FieldResolutionResult {
            value: value.clone(),
            confidence,
            diagnostics: vec![ParseDiagnostic::info(
                step.target_key.clone(),
                Stage::Extractor,
                "Resolved via lean-LLM fallback".to_string(),
            )],
            resolver_name: self.name().to_string(),
        }))
    }
}
