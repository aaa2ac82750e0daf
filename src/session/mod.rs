//! `Session`: a long-lived handle binding one schema/instructions/options
//! to a locked `SearchPlan`, letting repeated parses of similar input skip
//! the architect entirely (spec §4.10).

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::orchestrator::Orchestrator;
use crate::types::plan::SearchPlan;
use crate::types::request::{ParseOptions, ParseRequest};
use crate::types::response::ParseResponse;
use crate::types::schema::OutputSchema;

/// Tuning for a `Session`'s plan auto-refresh policy.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// A locked plan whose confidence drops below this triggers a refresh.
    pub confidence_refresh_threshold: f64,
    /// Minimum time between refresh attempts, to avoid hammering the
    /// architect on a run of consecutive low-confidence parses.
    pub refresh_cooldown: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            confidence_refresh_threshold: 0.5,
            refresh_cooldown: Duration::from_secs(30),
        }
    }
}

/// A bound schema + instructions + options, holding at most one locked
/// plan, reused across `parse` calls until it needs refreshing (spec §4.10).
pub struct Session {
    orchestrator: Arc<Orchestrator>,
    schema: OutputSchema,
    instructions: Option<String>,
    options: ParseOptions,
    config: SessionConfig,
    plan: Mutex<Option<SearchPlan>>,
    last_refresh: Mutex<Option<Instant>>,
}

impl Session {
    #[must_use]
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        schema: OutputSchema,
        instructions: Option<String>,
        options: ParseOptions,
        config: SessionConfig,
    ) -> Self {
        Self {
            orchestrator,
            schema,
            instructions,
            options,
            config,
            plan: Mutex::new(None),
            last_refresh: Mutex::new(None),
        }
    }

    fn build_request(&self, input_data: String, overrides: Option<ParseOptions>) -> ParseRequest {
        ParseRequest {
            input_data,
            output_schema: self.schema.clone(),
            instructions: self.instructions.clone(),
            options: overrides.unwrap_or_else(|| self.options.clone()),
        }
    }

    fn should_refresh(&self, existing: &Option<SearchPlan>) -> bool {
        let Some(plan) = existing else {
            return true;
        };
        if plan.metadata.planner_confidence >= self.config.confidence_refresh_threshold {
            return false;
        }
        match *self.last_refresh.lock() {
            None => true,
            Some(last) => last.elapsed() >= self.config.refresh_cooldown,
        }
    }

    /// Parse one input under this session's locked plan, refreshing the
    /// plan first if it is weak and the refresh cooldown has elapsed.
    pub async fn parse(&self, input_data: impl Into<String>, overrides: Option<ParseOptions>) -> ParseResponse {
        let request = self.build_request(input_data.into(), overrides);
        let existing = self.plan.lock().clone();

        if self.should_refresh(&existing) {
            let response = self.orchestrator.parse(request).await;
            *self.plan.lock() = Some(response.metadata.plan.clone_plan());
            *self.last_refresh.lock() = Some(Instant::now());
            response
        } else {
            self.orchestrator.parse_with_plan(request, existing).await
        }
    }

    /// Parse several inputs in order, reusing (and possibly refreshing) the
    /// session's locked plan across the batch (spec §4.10 `parseMany`).
    pub async fn parse_many(
        &self,
        inputs: Vec<String>,
        overrides: Option<ParseOptions>,
    ) -> Vec<ParseResponse> {
        let mut responses = Vec::with_capacity(inputs.len());
        for input in inputs {
            responses.push(self.parse(input, overrides.clone()).await);
        }
        responses
    }

    /// A copy of the currently locked plan, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<SearchPlan> {
        self.plan.lock().clone()
    }

    /// Drop the locked plan, forcing the next `parse` to rebuild it.
    pub fn dispose(&self) {
        *self.plan.lock() = None;
        *self.last_refresh.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::cache::{InMemoryPlanCache, PlanCache};
    use crate::telemetry::TelemetryBus;
    use crate::types::config::EngineConfig;
    use crate::types::schema::{FieldDescriptor, ValidationType};

    fn session() -> Session {
        let cache: Arc<dyn PlanCache> = Arc::new(InMemoryPlanCache::new(Some(10), Duration::from_secs(60)));
        let orchestrator = Arc::new(Orchestrator::new(EngineConfig::default(), cache, Arc::new(TelemetryBus::new())));
        let mut schema = OutputSchema::new();
        schema.insert("name".to_string(), FieldDescriptor::new(ValidationType::Name));
        Session::new(orchestrator, schema, None, ParseOptions::default(), SessionConfig::default())
    }

    #[tokio::test]
    async fn first_parse_builds_and_locks_a_plan() {
        let session = session();
        assert!(session.snapshot().is_none());
        let response = session.parse(r#"{"Name":"Ada"}"#, None).await;
        assert!(response.success);
        assert!(session.snapshot().is_some());
    }

    #[tokio::test]
    async fn second_parse_reuses_the_locked_plan_without_rebuilding() {
        let session = session();
        let first = session.parse(r#"{"Name":"Ada"}"#, None).await;
        let locked_after_first = session.snapshot().unwrap();
        let second = session.parse(r#"{"Name":"Grace"}"#, None).await;
        assert!(first.success && second.success);
        assert_eq!(second.metadata.plan.id, locked_after_first.id);
    }

    #[tokio::test]
    async fn dispose_clears_the_locked_plan() {
        let session = session();
        session.parse(r#"{"Name":"Ada"}"#, None).await;
        assert!(session.snapshot().is_some());
        session.dispose();
        assert!(session.snapshot().is_none());
    }
}
