//! Resolver trait and the ordered `ResolverRegistry` (spec §4.6).

use async_trait::async_trait;

use super::context::ExtractionContext;
use crate::error::Result;
use crate::types::plan::SearchStep;
use crate::types::{ParseDiagnostic, Stage, Value};

/// What a resolver produced for one `SearchStep` (spec §3).
#[derive(Debug, Clone)]
pub struct FieldResolutionResult {
    pub value: Value,
    pub confidence: f64,
    pub diagnostics: Vec<ParseDiagnostic>,
    pub resolver_name: String,
}

/// A component that attempts to produce a value for one step from the
/// input + shared `ExtractionContext` (spec GLOSSARY). Resolvers MUST NOT
/// propagate errors past their own boundary (spec §7); a resolver
/// returning `Err` is caught by the registry and converted to a warning
/// diagnostic, then the chain continues to the next resolver.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Human-readable name, used in diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this resolver is willing to attempt `step` at all (a filter,
    /// not a guarantee of success).
    fn supports(&self, step: &SearchStep, ctx: &ExtractionContext) -> bool;

    /// Attempt to resolve `step`. `Ok(None)` means "no value, try the next
    /// resolver"; `Ok(Some(_))` means this resolver wins the step.
    async fn resolve(
        &self,
        step: &SearchStep,
        ctx: &ExtractionContext,
    ) -> Result<Option<FieldResolutionResult>>;
}

/// The ordered chain of resolvers (spec §4.6). First resolver whose
/// `supports` is true and whose `resolve` returns `Some` wins.
pub struct ResolverRegistry {
    resolvers: Vec<Box<dyn Resolver>>,
}

impl ResolverRegistry {
    /// Build a registry from an explicit ordered list.
    #[must_use]
    pub fn new(resolvers: Vec<Box<dyn Resolver>>) -> Self {
        Self { resolvers }
    }

    /// Resolve one step, returning the winning result (if any) plus every
    /// diagnostic accumulated along the way, across all attempted
    /// resolvers for this field (spec §4.6: "Diagnostics accumulate across
    /// resolvers for the same field").
    pub async fn resolve(
        &self,
        step: &SearchStep,
        ctx: &ExtractionContext,
    ) -> (Option<FieldResolutionResult>, Vec<ParseDiagnostic>) {
        let mut diagnostics = Vec::new();

        for resolver in &self.resolvers {
            if !resolver.supports(step, ctx) {
                continue;
            }

            match resolver.resolve(step, ctx).await {
                Ok(Some(mut result)) => {
                    diagnostics.append(&mut result.diagnostics);
                    return (Some(result), diagnostics);
                }
                Ok(None) => {}
                Err(err) => {
                    diagnostics.push(ParseDiagnostic::warning(
                        step.target_key.clone(),
                        Stage::Extractor,
                        format!("resolver {} failed: {err}", resolver.name()),
                    ));
                }
            }
        }

        (None, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::plan::DetectedFormat;
    use crate::types::schema::ValidationType;

    struct AlwaysMiss;

    #[async_trait]
    impl Resolver for AlwaysMiss {
        fn name(&self) -> &'static str {
            "always_miss"
        }
        fn supports(&self, _step: &SearchStep, _ctx: &ExtractionContext) -> bool {
            true
        }
        async fn resolve(
            &self,
            _step: &SearchStep,
            _ctx: &ExtractionContext,
        ) -> Result<Option<FieldResolutionResult>> {
            Ok(None)
        }
    }

    struct AlwaysHit;

    #[async_trait]
    impl Resolver for AlwaysHit {
        fn name(&self) -> &'static str {
            "always_hit"
        }
        fn supports(&self, _step: &SearchStep, _ctx: &ExtractionContext) -> bool {
            true
        }
        async fn resolve(
            &self,
            _step: &SearchStep,
            _ctx: &ExtractionContext,
        ) -> Result<Option<FieldResolutionResult>> {
            Ok(Some(FieldResolutionResult {
                value: Value::String("found".to_string()),
                confidence: 0.9,
                diagnostics: vec![],
                resolver_name: "always_hit".to_string(),
            }))
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl Resolver for AlwaysFails {
        fn name(&self) -> &'static str {
            "always_fails"
        }
        fn supports(&self, _step: &SearchStep, _ctx: &ExtractionContext) -> bool {
            true
        }
        async fn resolve(
            &self,
            _step: &SearchStep,
            _ctx: &ExtractionContext,
        ) -> Result<Option<FieldResolutionResult>> {
            Err(crate::error::Error::Extractor("boom".to_string()))
        }
    }

    fn sample_step() -> SearchStep {
        SearchStep {
            target_key: "name".to_string(),
            description: "name".to_string(),
            search_instruction: String::new(),
            validation_type: ValidationType::Name,
            is_required: true,
            fallback_value: None,
        }
    }

    #[tokio::test]
    async fn first_hit_wins_and_earlier_misses_contribute_diagnostics() {
        let registry = ResolverRegistry::new(vec![Box::new(AlwaysMiss), Box::new(AlwaysHit)]);
        let ctx = ExtractionContext::new(String::new(), DetectedFormat::Prose);
        let (result, _diagnostics) = registry.resolve(&sample_step(), &ctx).await;
        assert_eq!(result.unwrap().resolver_name, "always_hit");
    }

    #[tokio::test]
    async fn a_failing_resolver_does_not_stop_the_chain() {
        let registry = ResolverRegistry::new(vec![Box::new(AlwaysFails), Box::new(AlwaysHit)]);
        let ctx = ExtractionContext::new(String::new(), DetectedFormat::Prose);
        let (result, diagnostics) = registry.resolve(&sample_step(), &ctx).await;
        assert!(result.is_some());
        assert_eq!(diagnostics.len(), 1);
    }
}
