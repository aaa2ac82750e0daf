//! Per-validation-type regex primitives (spec §4.5, §4.6).
//!
//! Each function extracts the first matching candidate for its validation
//! type from a haystack. Used both by the validation-default resolver
//! (applied to the whole input) and by the section/loose-KV resolvers
//! (applied to a narrower candidate string).

use regex::Regex;
use std::sync::OnceLock;

use crate::types::schema::ValidationType;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").unwrap()
    })
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\+?\d{1,3}[\s.\-]?)?(\(?\d{3}\)?[\s.\-]?)\d{3}[\s.\-]?\d{4}").unwrap()
    })
}

fn iso_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap())
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{2,4}|[A-Z][a-z]+ \d{1,2},? \d{4}")
            .unwrap()
    })
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://[^\s]+").unwrap())
}

fn currency_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[$€£]\s?-?\d[\d,]*(\.\d+)?").unwrap())
}

fn percentage_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d+(\.\d+)?\s?%").unwrap())
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d+(\.\d+)?").unwrap())
}

fn boolean_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(true|false|yes|no)\b").unwrap())
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(Dr\.|Mr\.|Mrs\.|Ms\.)?\s?[A-Z][a-z]+(\s[A-Z]\.)?\s[A-Z][a-zA-Z'\-]+").unwrap()
    })
}

/// Attempt to extract a single candidate string matching `validation_type`
/// from `haystack`. Returns `None` for types with no dedicated pattern
/// (`String`, `StringArray`, `NumberArray`, `Object`, `Custom`) — those are
/// left to the resolvers' own heuristics (first line, split on delimiters).
#[must_use]
pub fn extract_candidate(validation_type: ValidationType, haystack: &str) -> Option<String> {
    let matched = match validation_type {
        ValidationType::Email => email_re().find(haystack).map(|m| m.as_str().to_string()),
        ValidationType::Phone => phone_re().find(haystack).map(|m| m.as_str().to_string()),
        ValidationType::IsoDate => iso_date_re().find(haystack).map(|m| m.as_str().to_string()),
        ValidationType::Date => date_re().find(haystack).map(|m| m.as_str().to_string()),
        ValidationType::Url => url_re().find(haystack).map(|m| m.as_str().to_string()),
        ValidationType::Currency => currency_re().find(haystack).map(|m| m.as_str().to_string()),
        ValidationType::Percentage => {
            percentage_re().find(haystack).map(|m| m.as_str().to_string())
        }
        ValidationType::Number => number_re().find(haystack).map(|m| m.as_str().to_string()),
        ValidationType::Boolean => boolean_re().find(haystack).map(|m| m.as_str().to_string()),
        ValidationType::Name => name_re().find(haystack).map(|m| m.as_str().to_string()),
        ValidationType::Address => {
            // No dedicated format; a line containing a number followed by
            // words is a reasonable street-address heuristic.
            haystack
                .lines()
                .find(|l| l.trim().chars().next().is_some_and(|c| c.is_ascii_digit()))
                .map(|l| l.trim().to_string())
        }
        ValidationType::String
        | ValidationType::StringArray
        | ValidationType::NumberArray
        | ValidationType::Object
        | ValidationType::Custom => None,
    };
    matched.filter(|s| !s.trim().is_empty())
}

/// Infer a `ValidationType` from a schema field's name, per spec §4.5
/// (`"email"` -> email, `"*date*"` -> date, `"total|amount|price"` ->
/// currency, `"phone"` -> phone, ...). Falls back to `String`.
#[must_use]
pub fn infer_validation_type(field_name: &str) -> ValidationType {
    let lower = field_name.to_lowercase();
    if lower.contains("email") {
        ValidationType::Email
    } else if lower.contains("phone") {
        ValidationType::Phone
    } else if lower.contains("date") {
        if lower.contains("iso") {
            ValidationType::IsoDate
        } else {
            ValidationType::Date
        }
    } else if lower.contains("total") || lower.contains("amount") || lower.contains("price")
        || lower.contains("revenue") || lower.contains("cost")
    {
        ValidationType::Currency
    } else if lower.contains("percent") || lower.contains("rate") {
        ValidationType::Percentage
    } else if lower.contains("url") || lower.contains("website") || lower.contains("link") {
        ValidationType::Url
    } else if lower.contains("address") {
        ValidationType::Address
    } else if lower.contains("name") {
        ValidationType::Name
    } else if lower.ends_with("s") && (lower.contains("tag") || lower.contains("item") || lower.contains("list")) {
        ValidationType::StringArray
    } else {
        ValidationType::String
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_email() {
        let candidate = extract_candidate(ValidationType::Email, "Contact: ada@analytical.engine");
        assert_eq!(candidate.as_deref(), Some("ada@analytical.engine"));
    }

    #[test]
    fn extracts_iso_date() {
        let candidate = extract_candidate(ValidationType::IsoDate, "Due Date: 2024-02-01");
        assert_eq!(candidate.as_deref(), Some("2024-02-01"));
    }

    #[test]
    fn extracts_currency() {
        let candidate = extract_candidate(ValidationType::Currency, "Invoice Total: $1,234.56");
        assert_eq!(candidate.as_deref(), Some("$1,234.56"));
    }

    #[test]
    fn infers_currency_from_field_name() {
        assert_eq!(infer_validation_type("invoice_total"), ValidationType::Currency);
        assert_eq!(infer_validation_type("due_date"), ValidationType::Date);
        assert_eq!(infer_validation_type("customer_email"), ValidationType::Email);
    }
}
