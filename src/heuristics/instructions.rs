//! Per-field instruction parsing (spec §4.5).
//!
//! Detects lines like `"<FieldLabel>: guidance..."` or
//! `"<FieldLabel> - guidance..."` with indented continuation lines, and
//! attaches the parsed guidance to the matching `SearchStep` by comparing a
//! normalised form of the label against the schema key.

use std::collections::BTreeMap;

/// Normalise a label/key for loose comparison: lower-case, strip
/// non-alphanumerics (shared by the planner and the JSON-field resolver's
/// key-matching rule, spec §4.6).
#[must_use]
pub fn normalize_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Parse `instructions` into a map from normalised field label to guidance
/// text (continuation lines, indented in the source, are appended with a
/// space).
#[must_use]
pub fn parse_field_instructions(instructions: &str) -> BTreeMap<String, String> {
    let mut guidance: BTreeMap<String, String> = BTreeMap::new();
    let mut current_key: Option<String> = None;

    for line in instructions.lines() {
        let is_indented_continuation = line.starts_with(' ') || line.starts_with('\t');
        let trimmed = line.trim();
        if trimmed.is_empty() {
            current_key = None;
            continue;
        }

        if is_indented_continuation {
            if let Some(ref key) = current_key {
                guidance
                    .entry(key.clone())
                    .and_modify(|g| {
                        g.push(' ');
                        g.push_str(trimmed);
                    });
            }
            continue;
        }

        if let Some((label, rest)) = split_label(trimmed) {
            let key = normalize_key(label);
            guidance.insert(key.clone(), rest.trim().to_string());
            current_key = Some(key);
        } else {
            current_key = None;
        }
    }

    guidance
}

fn split_label(line: &str) -> Option<(&str, &str)> {
    for sep in [": ", " - "] {
        if let Some(idx) = line.find(sep) {
            let (label, rest) = line.split_at(idx);
            let rest = &rest[sep.len()..];
            if !label.trim().is_empty() && label.len() < 64 {
                return Some((label.trim(), rest));
            }
        }
    }
    None
}

/// Look up guidance for a schema key by normalised comparison.
#[must_use]
pub fn guidance_for_field<'a>(
    guidance: &'a BTreeMap<String, String>,
    field_key: &str,
) -> Option<&'a str> {
    guidance.get(&normalize_key(field_key)).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dash_separated_guidance() {
        let instructions =
            "Customer Name - Prefer the full legal name from the contact record.";
        let guidance = parse_field_instructions(instructions);
        assert_eq!(
            guidance_for_field(&guidance, "customer_name"),
            Some("Prefer the full legal name from the contact record.")
        );
    }

    #[test]
    fn parses_continuation_lines() {
        let instructions = "Revenue: Look for the projected figure.\n  Round to nearest dollar.";
        let guidance = parse_field_instructions(instructions);
        assert_eq!(
            guidance_for_field(&guidance, "revenue"),
            Some("Look for the projected figure. Round to nearest dollar.")
        );
    }
}
