//! System-context detector: scores a set of domain profiles from schema +
//! instructions + sample and returns a labelled context or `"generic"`
//! (spec §4.4).
//!
//! Context definitions are a static table keyed by id, kept alongside their
//! keywords/summary/weights for testability (spec §9).

use crate::types::config::DetectorConfig;
use crate::types::context::DetectedSystemContext;

/// A registered domain profile: id, display label, and keyword set.
#[derive(Debug, Clone)]
pub struct ContextDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub keywords: &'static [&'static str],
}

/// The static table of registered context definitions (spec §3's id list:
/// crm, finance, healthcare, logistics, legal, ecommerce, marketing,
/// real_estate, generic). `generic` is not itself scored; it is the
/// fallback result.
#[must_use]
pub fn context_definitions() -> &'static [ContextDefinition] {
    &[
        ContextDefinition {
            id: "crm",
            label: "CRM",
            keywords: &[
                "customer", "contact", "lead", "account", "deal", "pipeline", "opportunity",
                "crm", "prospect", "sales rep",
            ],
        },
        ContextDefinition {
            id: "finance",
            label: "Finance",
            keywords: &[
                "invoice", "revenue", "total", "amount", "payment", "currency", "tax",
                "balance", "due date", "billing", "ledger",
            ],
        },
        ContextDefinition {
            id: "healthcare",
            label: "Healthcare",
            keywords: &[
                "patient", "diagnosis", "physician", "prescription", "dosage", "treatment",
                "clinical", "medical record", "symptom", "provider",
            ],
        },
        ContextDefinition {
            id: "logistics",
            label: "Logistics",
            keywords: &[
                "shipment", "tracking", "carrier", "warehouse", "freight", "delivery",
                "manifest", "pallet", "logistics", "consignment",
            ],
        },
        ContextDefinition {
            id: "legal",
            label: "Legal",
            keywords: &[
                "contract", "clause", "party", "agreement", "jurisdiction", "plaintiff",
                "defendant", "statute", "counsel", "liability",
            ],
        },
        ContextDefinition {
            id: "ecommerce",
            label: "E-commerce",
            keywords: &[
                "order", "sku", "cart", "checkout", "shipping address", "product", "inventory",
                "return", "refund", "coupon",
            ],
        },
        ContextDefinition {
            id: "marketing",
            label: "Marketing",
            keywords: &[
                "campaign", "impressions", "ctr", "conversion", "audience", "segment",
                "engagement", "funnel", "ad spend", "reach",
            ],
        },
        ContextDefinition {
            id: "real_estate",
            label: "Real Estate",
            keywords: &[
                "listing", "property", "square footage", "bedroom", "appraisal", "escrow",
                "mortgage", "landlord", "tenant", "lease",
            ],
        },
    ]
}

fn count_keyword_hits(keywords: &[&str], haystack: &str) -> (usize, Vec<String>) {
    let lower = haystack.to_lowercase();
    let mut matched = Vec::new();
    for keyword in keywords {
        if lower.contains(keyword) {
            matched.push((*keyword).to_string());
        }
    }
    (matched.len(), matched)
}

/// Detect the system context for a parse (spec §4.4).
///
/// `schema_field_names` are the flattened dotted schema keys;
/// `instructions` and `sample` are searched case-insensitively;
/// `domain_hints` and `explicit_hint` come from `ParseOptions`.
#[must_use]
pub fn detect(
    config: &DetectorConfig,
    schema_field_names: &[String],
    instructions: Option<&str>,
    sample: &str,
    domain_hints: &[String],
    explicit_hint: Option<&str>,
) -> DetectedSystemContext {
    let schema_text = schema_field_names.join(" ");
    let instructions_text = instructions.unwrap_or("");
    let bounded_sample: String = sample.chars().take(config.sample_length).collect();
    let hints_text = domain_hints.join(" ");

    let mut scored: Vec<(&ContextDefinition, f64, Vec<String>, Vec<String>, Vec<String>)> =
        Vec::new();

    for definition in context_definitions() {
        let (schema_hits, schema_matches) = count_keyword_hits(definition.keywords, &schema_text);
        let (instr_hits, instr_matches) =
            count_keyword_hits(definition.keywords, instructions_text);
        let (sample_hits, _) = count_keyword_hits(definition.keywords, &bounded_sample);
        let (hint_hits, _) = count_keyword_hits(definition.keywords, &hints_text);

        let mut score = schema_hits as f64 * config.schema_weight
            + instr_hits as f64 * config.instruction_weight
            + sample_hits as f64 * config.sample_weight
            + hint_hits as f64 * config.hint_weight;

        if let Some(explicit) = explicit_hint {
            if explicit.eq_ignore_ascii_case(definition.id) {
                score += config.hint_boost;
            }
        }

        let mut rationale = Vec::new();
        if schema_hits > 0 {
            rationale.push(format!("{schema_hits} schema field keyword match(es)"));
        }
        if instr_hits > 0 {
            rationale.push(format!("{instr_hits} instruction keyword match(es)"));
        }
        if sample_hits > 0 {
            rationale.push(format!("{sample_hits} sample keyword match(es)"));
        }
        if hint_hits > 0 {
            rationale.push(format!("{hint_hits} domain-hint keyword match(es)"));
        }

        scored.push((definition, score, schema_matches, instr_matches, rationale));
    }

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let Some((top, top_score, matched_fields, matched_instruction_terms, rationale)) =
        scored.first()
    else {
        return DetectedSystemContext::generic();
    };

    let second_score = scored.get(1).map_or(0.0, |(_, score, ..)| *score);

    if *top_score < config.minimum_score
        || (top_score - second_score).abs() < config.ambiguity_delta
    {
        return DetectedSystemContext::generic();
    }

    let confidence = (0.35 + (1.0 + top_score).log2())
        .clamp(0.35, 0.95);

    DetectedSystemContext {
        id: top.id.to_string(),
        label: top.label.to_string(),
        confidence,
        matched_fields: matched_fields.clone(),
        matched_instruction_terms: matched_instruction_terms.clone(),
        rationale: rationale.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finance_keywords_win_over_generic() {
        let config = DetectorConfig::default();
        let fields = vec!["invoice_total".to_string(), "due_date".to_string()];
        let context = detect(&config, &fields, None, "Invoice Total: $1,234.56", &[], None);
        assert_eq!(context.id, "finance");
        assert!(context.confidence >= 0.35);
    }

    #[test]
    fn ambiguous_scores_fall_back_to_generic() {
        let config = DetectorConfig::default();
        let context = detect(&config, &[], None, "", &[], None);
        assert_eq!(context.id, "generic");
    }

    #[test]
    fn explicit_hint_adds_boost() {
        let config = DetectorConfig::default();
        let fields = vec!["name".to_string()];
        let with_hint = detect(&config, &fields, None, "", &[], Some("crm"));
        assert_eq!(with_hint.id, "crm");
    }
}
