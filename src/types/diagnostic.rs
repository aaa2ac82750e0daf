//! `ParseDiagnostic` (spec §3, §7).

use serde::{Deserialize, Serialize};

/// Pipeline stage a diagnostic was raised at (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Preprocess,
    Validation,
    Architect,
    Extractor,
    Postprocess,
    Orchestration,
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A structured note emitted during parsing and returned to the caller
/// (spec §3). Diagnostics are append-only within a parse; ordering is
/// stable (invariant 5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseDiagnostic {
    /// Schema field key, or `"*"` for a parse-wide diagnostic.
    pub field: String,
    pub stage: Stage,
    pub message: String,
    pub severity: Severity,
}

impl ParseDiagnostic {
    /// Build an `info`-level diagnostic.
    #[must_use]
    pub fn info(field: impl Into<String>, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            stage,
            message: message.into(),
            severity: Severity::Info,
        }
    }

    /// Build a `warning`-level diagnostic.
    #[must_use]
    pub fn warning(field: impl Into<String>, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            stage,
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    /// Build an `error`-level diagnostic.
    #[must_use]
    pub fn error(field: impl Into<String>, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            stage,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// Diagnostics that apply to the whole parse rather than one field use
    /// the sentinel key `"*"` (spec §3).
    #[must_use]
    pub fn parse_wide(stage: Stage, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            field: "*".to_string(),
            stage,
            message: message.into(),
            severity,
        }
    }
}
