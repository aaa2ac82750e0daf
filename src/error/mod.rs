//! Error taxonomy for the extraction engine.
//!
//! Mirrors the stage taxonomy in spec §7: `Validation`, `Preprocess`,
//! `Architect`, `Extractor`, `Fallback`, `Orchestration`, plus the
//! infrastructure variants every stage can also raise.

pub mod cache;

pub use cache::CacheError;

/// Result type alias for the extraction engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the extraction engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input/schema/options violated a hard constraint. Always fatal for the
    /// parse. `code` is the stable machine-readable boundary code from spec
    /// §8 (e.g. `EMPTY_INPUT_DATA`, `INPUT_TOO_LARGE`, `SCHEMA_TOO_LARGE`,
    /// `INVALID_INSTRUCTIONS`).
    #[error("validation failed: {message}")]
    Validation { code: &'static str, message: String },

    /// A preprocessor hook rejected the request or raised a fatal diagnostic.
    #[error("preprocess failed: {0}")]
    Preprocess(String),

    /// The architect could not produce a plan (heuristic failure, or both
    /// heuristic and model-rewrite failed).
    #[error("architect failed: {0}")]
    Architect(String),

    /// The extractor could not complete plan execution at all (distinct from
    /// a single field resolution failure, which is soft and never reaches
    /// this variant).
    #[error("extractor failed: {0}")]
    Extractor(String),

    /// The lean-LLM fallback client failed. Always soft in practice; kept
    /// here for callers that want to log or count it.
    #[error("fallback failed: {0}")]
    Fallback(String),

    /// Cancellation, timeout, or an unexpected failure at the orchestration
    /// boundary.
    #[error("orchestration failed: {0}")]
    Orchestration(String),

    /// Plan-cache operation error.
    #[error("{0}")]
    Cache(#[from] CacheError),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error (e.g. reading environment-backed configuration).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unparseable configuration value.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Whether this error is eligible for retry with backoff.
    ///
    /// Only the architect's heuristic-retry path consults this; resolver and
    /// preprocessor failures never reach the retry policy since they are
    /// captured locally as diagnostics (spec §7).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Architect(_) | Error::Io(_) => true,
            Error::Cache(cache_err) => matches!(
                cache_err,
                CacheError::EvictionFailed { .. } | CacheError::SerializationFailed { .. }
            ),
            Error::Validation { .. }
            | Error::Preprocess(_)
            | Error::Extractor(_)
            | Error::Fallback(_)
            | Error::Orchestration(_)
            | Error::Serialization(_)
            | Error::Configuration(_) => false,
        }
    }

    /// The `ParseDiagnostic` stage this error corresponds to, per spec §3/§7.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "validation",
            Error::Preprocess(_) => "preprocess",
            Error::Architect(_) => "architect",
            Error::Extractor(_) => "extractor",
            Error::Fallback(_) => "extractor",
            Error::Orchestration(_) => "orchestration",
            Error::Cache(_) | Error::Serialization(_) | Error::Io(_) | Error::Configuration(_) => {
                "orchestration"
            }
        }
    }

    /// The stable machine-readable boundary code (spec §8), if this error
    /// carries one.
    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Error::Validation { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn architect_errors_are_recoverable() {
        let err = Error::Architect("heuristic planner panicked".to_string());
        assert!(err.is_recoverable());
        assert_eq!(err.stage(), "architect");
    }

    #[test]
    fn validation_errors_are_not_recoverable() {
        let err = Error::Validation {
            code: "EMPTY_INPUT_DATA",
            message: "empty input".to_string(),
        };
        assert!(!err.is_recoverable());
        assert_eq!(err.stage(), "validation");
        assert_eq!(err.code(), Some("EMPTY_INPUT_DATA"));
    }

    #[test]
    fn cache_error_conversion() {
        let cache_err = CacheError::EvictionFailed {
            reason: "lock poisoned".to_string(),
        };
        let err: Error = cache_err.into();
        assert!(err.is_recoverable());
    }

    #[test]
    fn serialization_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("serialization error"));
    }
}
