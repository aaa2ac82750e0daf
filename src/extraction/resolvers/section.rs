//! Section resolver (spec §4.6, #2).

use async_trait::async_trait;

use crate::constants::resolver::{SECTION_CONFIDENCE_BASE, SECTION_CONFIDENCE_SCALE, SECTION_MIN_SCORE};
use crate::error::Result;
use crate::extraction::context::ExtractionContext;
use crate::extraction::registry::{FieldResolutionResult, Resolver};
use crate::heuristics::segmentation::Section;
use crate::heuristics::validation::extract_candidate;
use crate::types::plan::SearchStep;
use crate::types::{ParseDiagnostic, Stage, Value};

/// Segments the input once (cached in `ExtractionContext`) and scores each
/// section against the target key using heading equality, substring, word
/// overlap, and label occurrence within the body.
pub struct SectionResolver;

fn score_section(section: &Section, target_key: &str, description: &str) -> f64 {
    let target_words: Vec<String> = target_key
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    let heading_lower = section.heading.as_deref().unwrap_or("").to_lowercase();
    let mut score = 0.0;

    if !heading_lower.is_empty() {
        let heading_words: Vec<&str> = heading_lower.split_whitespace().collect();
        let joined_target = target_words.join(" ");
        if heading_lower == joined_target || heading_lower.replace(' ', "_") == target_key.to_lowercase() {
            score += 1.0;
        } else if heading_lower.contains(&joined_target) || joined_target.contains(&heading_lower) {
            score += 0.5;
        }

        let overlap = target_words
            .iter()
            .filter(|w| heading_words.contains(&w.as_str()))
            .count();
        if !target_words.is_empty() {
            score += (overlap as f64 / target_words.len() as f64) * 0.4;
        }
    }

    let body_lower = section.body().to_lowercase();
    let description_lower = description.to_lowercase();
    if !description_lower.is_empty() && body_lower.contains(&description_lower) {
        score += 0.2;
    }
    for word in &target_words {
        if body_lower.contains(word.as_str()) {
            score += 0.05;
        }
    }

    score
}

#[async_trait]
impl Resolver for SectionResolver {
    fn name(&self) -> &'static str {
        "section"
    }

    fn supports(&self, _step: &SearchStep, _ctx: &ExtractionContext) -> bool {
        true
    }

    async fn resolve(
        &self,
        step: &SearchStep,
        ctx: &ExtractionContext,
    ) -> Result<Option<FieldResolutionResult>> {
        let sections = ctx.sections();
        let mut best: Option<(&Section, f64)> = None;

        for section in &sections {
            let score = score_section(section, &step.target_key, &step.description);
            if score > best.map_or(0.0, |(_, s)| s) {
                best = Some((section, score));
            }
        }

        let Some((section, score)) = best else {
            return Ok(None);
        };

        if score <= SECTION_MIN_SCORE {
            return Ok(None);
        }

        let body = section.body();
        let candidate = extract_candidate(step.validation_type, &body)
            .or_else(|| section.lines.first().map(|l| l.trim().to_string()));

        let Some(candidate) = candidate.filter(|c| !c.is_empty()) else {
            return Ok(None);
        };

        let confidence = (SECTION_CONFIDENCE_BASE + score * SECTION_CONFIDENCE_SCALE).clamp(0.0, 0.88);

        Ok(Some(FieldResolutionResult {
            value: Value::String(candidate),
            confidence,
            diagnostics: vec![ParseDiagnostic::info(
                step.target_key.clone(),
                Stage::Extractor,
                format!(
                    "Resolved via section \"{}\"",
                    section.heading.clone().unwrap_or_default()
                ),
            )],
            resolver_name: self.name().to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::plan::DetectedFormat;
    use crate::types::schema::ValidationType;

    fn step() -> SearchStep {
        SearchStep {
            target_key: "notes".to_string(),
            description: "notes".to_string(),
            search_instruction: String::new(),
            validation_type: ValidationType::String,
            is_required: true,
            fallback_value: None,
        }
    }

    #[tokio::test]
    async fn matches_heading_equal_to_target_key() {
        let ctx = ExtractionContext::new(
            "CONTACT\nName: Ada\n\nNOTES:\nPrefers email over phone.".to_string(),
            DetectedFormat::Prose,
        );
        let resolver = SectionResolver;
        let result = resolver.resolve(&step(), &ctx).await.unwrap().unwrap();
        assert_eq!(result.value.as_str(), Some("Prefers email over phone."));
    }

    #[tokio::test]
    async fn below_threshold_score_returns_none() {
        let ctx = ExtractionContext::new(
            "UNRELATED\nFoo bar baz.".to_string(),
            DetectedFormat::Prose,
        );
        let resolver = SectionResolver;
        let result = resolver.resolve(&step(), &ctx).await.unwrap();
        assert!(result.is_none());
    }
}
