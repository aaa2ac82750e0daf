//! Structured-section segmentation (spec §4.5).

/// One section of segmented input: a heading line (if any) and its body lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub heading: Option<String>,
    pub lines: Vec<String>,
}

impl Section {
    /// The body joined back into a single string.
    #[must_use]
    pub fn body(&self) -> String {
        self.lines.join("\n")
    }
}

/// Split text into sections by heading lines: all-uppercase lines,
/// `:`-terminated lines, or markdown-style (`#`-prefixed) lines (spec §4.5).
#[must_use]
pub fn segment(input: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = Section {
        heading: None,
        lines: Vec::new(),
    };

    for line in input.lines() {
        if is_heading(line) {
            if current.heading.is_some() || !current.lines.is_empty() {
                sections.push(current);
            }
            current = Section {
                heading: Some(normalize_heading(line)),
                lines: Vec::new(),
            };
        } else if !line.trim().is_empty() {
            current.lines.push(line.to_string());
        }
    }
    if current.heading.is_some() || !current.lines.is_empty() {
        sections.push(current);
    }
    sections
}

fn is_heading(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    if let Some(stripped) = trimmed.strip_prefix('#') {
        return !stripped.trim().is_empty();
    }
    if trimmed.ends_with(':') && trimmed.len() < 80 && !trimmed.contains(". ") {
        return true;
    }
    let letters: String = trimmed.chars().filter(|c| c.is_alphabetic()).collect();
    !letters.is_empty() && letters == letters.to_uppercase() && trimmed.len() < 80
}

fn normalize_heading(line: &str) -> String {
    line.trim()
        .trim_start_matches('#')
        .trim()
        .trim_end_matches(':')
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_uppercase_and_colon_headings() {
        let input = "CONTACT\nName: Ada Lovelace\n\nNOTES:\nPrefers email.";
        let sections = segment(input);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading.as_deref(), Some("CONTACT"));
        assert_eq!(sections[1].heading.as_deref(), Some("NOTES"));
    }

    #[test]
    fn markdown_headings_are_recognised() {
        let input = "# Billing\nTotal: $10";
        let sections = segment(input);
        assert_eq!(sections[0].heading.as_deref(), Some("Billing"));
    }
}
