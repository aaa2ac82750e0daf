//! Input format detection (spec §4.5).

use crate::constants::resolver::MIN_KEY_VALUE_LINES;
use crate::types::plan::DetectedFormat;

/// Classify raw input text. JSON wins if it parses as an object; otherwise
/// CSV if the first line is comma-delimited with at least two dividing
/// commas on subsequent lines; otherwise structured key-value if at least
/// `MIN_KEY_VALUE_LINES` lines match `key: value` / `key = value` /
/// `key - value`; otherwise prose.
#[must_use]
pub fn detect_format(input: &str) -> DetectedFormat {
    if let Ok(serde_json::Value::Object(_)) = serde_json::from_str::<serde_json::Value>(input) {
        return DetectedFormat::Json;
    }

    let lines: Vec<&str> = input.lines().filter(|l| !l.trim().is_empty()).collect();

    if looks_like_csv(&lines) {
        return DetectedFormat::Csv;
    }

    let key_value_lines = lines.iter().filter(|l| parse_key_value(l).is_some()).count();
    if key_value_lines >= MIN_KEY_VALUE_LINES {
        return DetectedFormat::KeyValue;
    }

    DetectedFormat::Prose
}

fn looks_like_csv(lines: &[&str]) -> bool {
    let Some(first) = lines.first() else {
        return false;
    };
    let header_commas = first.matches(',').count();
    if header_commas < 1 {
        return false;
    }
    lines
        .iter()
        .skip(1)
        .filter(|line| line.matches(',').count() >= header_commas)
        .count()
        >= 1
}

/// Parse a single `key: value` / `key = value` / `key - value` /
/// `key — value` line. Returns `(key, value)` with both trimmed.
#[must_use]
pub fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    for sep in [": ", " = ", " - ", " — ", ":"] {
        if let Some(idx) = line.find(sep) {
            let (key, rest) = line.split_at(idx);
            let value = &rest[sep.len()..];
            let key = key.trim();
            let value = value.trim();
            if !key.is_empty() && !value.is_empty() && key.len() < 64 {
                return Some((key, value));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_json_object() {
        let input = r#"{"name":"Ada","age":36}"#;
        assert_eq!(detect_format(input), DetectedFormat::Json);
    }

    #[test]
    fn detects_key_value() {
        let input = "Invoice Total: $1,234.56\nDue Date: 2024-02-01\nNotes: net-30";
        assert_eq!(detect_format(input), DetectedFormat::KeyValue);
    }

    #[test]
    fn detects_csv() {
        let input = "name,age,email\nAda,36,ada@x.com\nGrace,85,grace@x.com";
        assert_eq!(detect_format(input), DetectedFormat::Csv);
    }

    #[test]
    fn falls_back_to_prose() {
        let input = "This is just a paragraph of plain prose with no structure to speak of.";
        assert_eq!(detect_format(input), DetectedFormat::Prose);
    }

    #[test]
    fn parses_multiple_separator_styles() {
        assert_eq!(parse_key_value("Name: Ada"), Some(("Name", "Ada")));
        assert_eq!(parse_key_value("Name = Ada"), Some(("Name", "Ada")));
        assert_eq!(parse_key_value("Name - Ada"), Some(("Name", "Ada")));
    }
}
