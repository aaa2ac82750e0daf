//! The top-level orchestrator (spec §4.11): validates, preprocesses, detects
//! context, consults the plan cache, invokes the architect on a miss, runs
//! the extractor, postprocesses, and assembles the `ParseResponse`.

use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::architect::{placeholder_plan, Architect, PlanRewriteClient};
use crate::context as detector;
use crate::error::{Error, Result};
use crate::extractor::Extractor;
use crate::heuristics::format::detect_format;
use crate::lean_llm::LeanLlmClient;
use crate::pipeline::{run_postprocessors, run_preprocessors};
use crate::retrieval::cache::{CacheKey, EvaluatedEntry, PlanCache, PlanCacheEntry};
use crate::telemetry::{CacheAction, CacheEventSource, Event, TelemetryBus};
use crate::types::config::EngineConfig;
use crate::types::plan::SearchPlan;
use crate::types::request::{ParseOptions, ParseRequest, Strategy};
use crate::types::response::{FailureStage, ParseError, ParseResponse, ResponseMetadata, StageBreakdown};
use crate::types::schema::flattened_keys;

/// Orchestrates a full parse end to end.
pub struct Orchestrator {
    config: EngineConfig,
    cache: Arc<dyn PlanCache>,
    telemetry: Arc<TelemetryBus>,
    architect: Architect,
    extractor: Extractor,
}

fn plan_affecting_options(options: &ParseOptions) -> String {
    let mut hints = options.domain_hints.clone();
    hints.sort();
    format!(
        "strategy={:?};confidence_threshold={:?};validate_output={};system_context_hint={:?};domain_hints={:?}",
        options.strategy, options.confidence_threshold, options.validate_output,
        options.system_context_hint, hints
    )
}

fn validate_instructions_payload(options: &ParseOptions) -> Result<()> {
    if options.domain_hints.len() > 10 {
        return Err(Error::Validation {
            code: "INVALID_INSTRUCTIONS",
            message: "at most 10 domain hints are permitted".to_string(),
        });
    }
    if options.domain_hints.iter().any(|hint| hint.chars().count() > 64) {
        return Err(Error::Validation {
            code: "INVALID_INSTRUCTIONS",
            message: "each domain hint must be at most 64 characters".to_string(),
        });
    }
    Ok(())
}

fn validate_request(request: &ParseRequest, limits: &crate::types::config::Limits) -> Result<()> {
    if request.input_data.trim().is_empty() {
        return Err(Error::Validation {
            code: "EMPTY_INPUT_DATA",
            message: "input_data must not be empty".to_string(),
        });
    }
    if request.input_data.len() > limits.max_input_length {
        return Err(Error::Validation {
            code: "INPUT_TOO_LARGE",
            message: format!(
                "input_data is {} bytes, exceeding the configured maximum of {}",
                request.input_data.len(),
                limits.max_input_length
            ),
        });
    }
    validate_instructions_payload(&request.options)
}

fn failure_stage_for(error: &Error) -> FailureStage {
    match error.stage() {
        "validation" => FailureStage::Validation,
        "preprocess" => FailureStage::Preprocess,
        "architect" => FailureStage::Architect,
        "extractor" => FailureStage::Extractor,
        "orchestration" => FailureStage::Orchestration,
        _ => FailureStage::Orchestration,
    }
}

impl Orchestrator {
    #[must_use]
    pub fn new(config: EngineConfig, cache: Arc<dyn PlanCache>, telemetry: Arc<TelemetryBus>) -> Self {
        let architect = Architect::new(config.architect.clone());
        let extractor = Extractor::new(
            config.extractor.clone(),
            config.fallback.clone(),
            Arc::new(crate::lean_llm::NullLeanLlmClient),
        );
        Self {
            config,
            cache,
            telemetry,
            architect,
            extractor,
        }
    }

    #[must_use]
    pub fn with_lean_client(mut self, client: Arc<dyn LeanLlmClient>) -> Self {
        self.extractor = Extractor::new(self.config.extractor.clone(), self.config.fallback.clone(), client);
        self
    }

    #[must_use]
    pub fn with_plan_rewriter(mut self, rewriter: Arc<dyn PlanRewriteClient>) -> Self {
        self.architect = Architect::new(self.config.architect.clone()).with_rewriter(rewriter);
        self
    }

    /// Kick off a best-effort background re-plan for a stale cache entry,
    /// replacing it atomically once the new plan is ready (spec §9: "atomic
    /// replace of the cache entry after the new plan is stored, not
    /// evict-then-replace"). Never touches the response already served for
    /// the triggering parse. Does not use the configured model rewriter —
    /// a background refresh stays heuristic-only to avoid an unbounded
    /// number of concurrent model calls.
    fn schedule_background_refresh(
        &self,
        key: CacheKey,
        request: &ParseRequest,
        format: crate::types::plan::DetectedFormat,
        detected_context: crate::types::context::DetectedSystemContext,
    ) {
        let cache = self.cache.clone();
        let architect = Architect::new(self.config.architect.clone());
        let request = request.clone();
        let profile = request.profile().to_string();
        tokio::spawn(async move {
            if let Ok((plan, diagnostics)) = architect.plan(&request, format, Some(&detected_context)).await {
                let entry = PlanCacheEntry {
                    key: key.clone(),
                    plan: plan.clone_plan(),
                    diagnostics,
                    confidence: plan.metadata.planner_confidence,
                    profile,
                    updated_at: chrono::Utc::now(),
                    expires_at: None,
                    stored_at: None,
                };
                let _ = cache.set(key, entry);
            }
        });
    }

    fn failure_response(
        &self,
        request_id: String,
        error: &Error,
        schema: &crate::types::schema::OutputSchema,
        strategy: Strategy,
        started: Instant,
    ) -> ParseResponse {
        let plan = placeholder_plan(schema, strategy);
        let mut response = ParseResponse {
            success: false,
            parsed_data: Default::default(),
            metadata: ResponseMetadata {
                plan,
                confidence: 0.0,
                tokens_used: 0,
                processing_time_ms: started.elapsed().as_millis() as u64,
                architect_tokens: 0,
                extractor_tokens: 0,
                request_id: request_id.clone(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                diagnostics: vec![],
                stage_breakdown: StageBreakdown::default(),
                fallback: None,
            },
            error: Some(ParseError {
                stage: failure_stage_for(error),
                message: error.to_string(),
                code: error.code().map(str::to_string),
            }),
        };
        response.clamp_counters();
        self.telemetry.emit(Event::ParseFinish {
            request_id,
            success: false,
        });
        response
    }

    /// Parse `request`, consulting and updating the plan cache.
    pub async fn parse(&self, request: ParseRequest) -> ParseResponse {
        self.parse_with_plan(request, None).await
    }

    /// Parse several requests in submission order (spec §4.10 `parseMany`).
    pub async fn parse_many(&self, requests: Vec<ParseRequest>) -> Vec<ParseResponse> {
        let mut responses = Vec::with_capacity(requests.len());
        for request in requests {
            responses.push(self.parse(request).await);
        }
        responses
    }

    /// Parse `request`. If `seed_plan` is given (a session reusing a locked
    /// plan), the cache and architect are bypassed entirely.
    pub async fn parse_with_plan(&self, mut request: ParseRequest, seed_plan: Option<SearchPlan>) -> ParseResponse {
        let started = Instant::now();
        let request_id = Uuid::new_v4().to_string();
        self.telemetry.emit(Event::ParseStart {
            request_id: request_id.clone(),
        });

        if let Err(err) = validate_request(&request, &self.config.limits) {
            return self.failure_response(
                request_id,
                &err,
                &request.output_schema,
                request.options.strategy.unwrap_or_default(),
                started,
            );
        }

        self.telemetry.emit(Event::PreprocessStart {
            request_id: request_id.clone(),
        });
        let mut diagnostics = match run_preprocessors(&mut request, &self.config.limits) {
            Ok(diags) => diags,
            Err(err) => {
                return self.failure_response(
                    request_id,
                    &err,
                    &request.output_schema,
                    request.options.strategy.unwrap_or_default(),
                    started,
                )
            }
        };
        self.telemetry.emit(Event::PreprocessFinish {
            request_id: request_id.clone(),
        });

        let format = detect_format(&request.input_data);
        let detected_context = detector::detect(
            &self.config.detector,
            &flattened_keys(&request.output_schema),
            request.instructions.as_deref(),
            &request.input_data,
            &request.options.domain_hints,
            request.options.system_context_hint.as_deref(),
        );

        let architect_started = Instant::now();
        let (plan, architect_tokens, architect_diagnostics) = match seed_plan {
            Some(plan) => (plan, 0u64, Vec::new()),
            None => {
                let schema_json = serde_json::to_string(&request.output_schema).unwrap_or_default();
                let options_fingerprint = plan_affecting_options(&request.options);
                let key = CacheKey::derive(
                    &schema_json,
                    request.instructions.as_deref(),
                    &options_fingerprint,
                    request.profile(),
                );

                let (evaluated, entry) = self.cache.evaluate(
                    &key,
                    self.config.cache.min_confidence,
                    self.config.cache.max_age,
                    self.config.cache.stale_after,
                );

                match (evaluated, entry) {
                    (EvaluatedEntry::Hit, Some(entry)) => {
                        self.telemetry.emit(Event::PlanCache {
                            request_id: Some(request_id.clone()),
                            action: CacheAction::Hit,
                            source: CacheEventSource::Core,
                        });
                        (entry.plan.as_cached(), 0, entry.diagnostics)
                    }
                    (EvaluatedEntry::Stale, Some(entry)) => {
                        self.telemetry.emit(Event::PlanCache {
                            request_id: Some(request_id.clone()),
                            action: CacheAction::Hit,
                            source: CacheEventSource::Core,
                        });
                        self.schedule_background_refresh(key.clone(), &request, format, detected_context.clone());
                        (entry.plan.as_cached(), 0, entry.diagnostics)
                    }
                    _ => {
                        self.telemetry.emit(Event::ArchitectStart {
                            request_id: request_id.clone(),
                        });
                        let built = self.architect.plan(&request, format, Some(&detected_context)).await;
                        self.telemetry.emit(Event::ArchitectFinish {
                            request_id: request_id.clone(),
                        });
                        match built {
                            Ok((plan, arch_diags)) => {
                                let tokens = plan.metadata.estimated_tokens;
                                let entry = PlanCacheEntry {
                                    key: key.clone(),
                                    plan: plan.clone_plan(),
                                    diagnostics: arch_diags.clone(),
                                    confidence: plan.metadata.planner_confidence,
                                    profile: request.profile().to_string(),
                                    updated_at: chrono::Utc::now(),
                                    expires_at: None,
                                    stored_at: None,
                                };
                                if self.cache.set(key, entry).is_ok() {
                                    self.telemetry.emit(Event::PlanCache {
                                        request_id: Some(request_id.clone()),
                                        action: CacheAction::Store,
                                        source: CacheEventSource::Core,
                                    });
                                }
                                (plan, tokens, arch_diags)
                            }
                            Err(err) => {
                                return self.failure_response(
                                    request_id,
                                    &err,
                                    &request.output_schema,
                                    request.options.strategy.unwrap_or_default(),
                                    started,
                                )
                            }
                        }
                    }
                }
            }
        };
        let architect_ms = architect_started.elapsed().as_millis() as u64;
        diagnostics.extend(architect_diagnostics);

        self.telemetry.emit(Event::ExtractorStart {
            request_id: request_id.clone(),
        });
        let extractor_started = Instant::now();
        let extractor_output = match self.extractor.execute(&plan, &request.input_data).await {
            Ok(output) => output,
            Err(err) => {
                return self.failure_response(
                    request_id,
                    &err,
                    &request.output_schema,
                    plan.strategy,
                    started,
                )
            }
        };
        let extractor_ms = extractor_started.elapsed().as_millis() as u64;
        self.telemetry.emit(Event::ExtractorFinish {
            request_id: request_id.clone(),
        });
        diagnostics.extend(extractor_output.diagnostics);

        let postprocess_diagnostics = run_postprocessors(
            &extractor_output.parsed_data,
            &request.output_schema,
            request.options.validate_output,
        );
        diagnostics.extend(postprocess_diagnostics);

        let extractor_tokens = extractor_output.fallback_usage.total_tokens;

        let mut response = ParseResponse {
            success: extractor_output.success,
            parsed_data: extractor_output.parsed_data,
            metadata: ResponseMetadata {
                plan,
                confidence: extractor_output.confidence,
                tokens_used: architect_tokens + extractor_tokens,
                processing_time_ms: started.elapsed().as_millis() as u64,
                architect_tokens,
                extractor_tokens,
                request_id: request_id.clone(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                diagnostics,
                stage_breakdown: StageBreakdown {
                    preprocess_ms: None,
                    architect_ms,
                    extractor_ms,
                    postprocess_ms: None,
                },
                fallback: Some(extractor_output.fallback_usage),
            },
            error: if extractor_output.success {
                None
            } else {
                Some(ParseError {
                    stage: FailureStage::Extractor,
                    message: "no required field resolved above its confidence floor".to_string(),
                    code: None,
                })
            },
        };
        response.clamp_counters();

        self.telemetry.emit(Event::ParseFinish {
            request_id,
            success: response.success,
        });

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::cache::InMemoryPlanCache;
    use crate::types::schema::{FieldDescriptor, OutputSchema, ValidationType};
    use std::time::Duration;

    fn orchestrator() -> Orchestrator {
        let cache: Arc<dyn PlanCache> = Arc::new(InMemoryPlanCache::new(Some(10), Duration::from_secs(60)));
        Orchestrator::new(EngineConfig::default(), cache, Arc::new(TelemetryBus::new()))
    }

    fn schema() -> OutputSchema {
        let mut schema = OutputSchema::new();
        schema.insert("name".to_string(), FieldDescriptor::new(ValidationType::Name));
        schema.insert("email".to_string(), FieldDescriptor::new(ValidationType::Email));
        schema
    }

    #[tokio::test]
    async fn empty_input_fails_with_stable_code() {
        let orchestrator = orchestrator();
        let request = ParseRequest {
            input_data: "   ".to_string(),
            output_schema: schema(),
            instructions: None,
            options: ParseOptions::default(),
        };
        let response = orchestrator.parse(request).await;
        assert!(!response.success);
        assert_eq!(response.error.as_ref().unwrap().code.as_deref(), Some("EMPTY_INPUT_DATA"));
    }

    #[tokio::test]
    async fn json_happy_path_succeeds_and_populates_metadata() {
        let orchestrator = orchestrator();
        let request = ParseRequest {
            input_data: r#"{"Name":"Ada Lovelace","Email":"ada@analytical.engine"}"#.to_string(),
            output_schema: schema(),
            instructions: None,
            options: ParseOptions::default(),
        };
        let response = orchestrator.parse(request).await;
        assert!(response.success);
        assert_eq!(
            response.parsed_data.get("name").and_then(crate::types::Value::as_str),
            Some("Ada Lovelace")
        );
        assert!(!response.metadata.request_id.is_empty());
    }

    #[tokio::test]
    async fn second_identical_request_hits_the_plan_cache() {
        let orchestrator = orchestrator();
        let make_request = || ParseRequest {
            input_data: r#"{"Name":"Ada","Email":"ada@x.com"}"#.to_string(),
            output_schema: schema(),
            instructions: None,
            options: ParseOptions::default(),
        };
        let first = orchestrator.parse(make_request()).await;
        let second = orchestrator.parse(make_request()).await;
        assert!(first.metadata.architect_tokens > 0);
        assert_eq!(second.metadata.architect_tokens, 0);
        assert_eq!(second.metadata.plan.metadata.origin, crate::types::PlanOrigin::Cached);
    }
}
