//! Error types for plan-cache operations.
//!
//! Mirrors the taxonomy a pluggable cache backend can report without
//! forcing every implementation to share a single concrete error type.

use std::fmt;

/// Errors that can occur during plan-cache operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Cache entry exceeds the backend's maximum allowed size.
    EntryTooLarge {
        /// The cache key.
        key: String,
        /// The actual size of the entry.
        size: usize,
        /// The maximum allowed size.
        max_size: usize,
    },
    /// Failed to serialize a plan for storage.
    SerializationFailed {
        /// The cache key.
        key: String,
        /// The serialization error message.
        error: String,
    },
    /// Failed to deserialize a stored plan.
    DeserializationFailed {
        /// The cache key.
        key: String,
        /// The deserialization error message.
        error: String,
    },
    /// LRU eviction could not complete.
    EvictionFailed {
        /// The reason for eviction failure.
        reason: String,
    },
    /// Invalid cache configuration (e.g. zero capacity).
    InvalidConfiguration {
        /// The configuration field that is invalid.
        field: String,
        /// The invalid value.
        value: String,
    },
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntryTooLarge {
                key,
                size,
                max_size,
            } => write!(
                f,
                "plan cache entry too large: key='{key}', size={size}, max_size={max_size}"
            ),
            Self::SerializationFailed { key, error } => {
                write!(f, "failed to serialize plan '{key}': {error}")
            }
            Self::DeserializationFailed { key, error } => {
                write!(f, "failed to deserialize plan '{key}': {error}")
            }
            Self::EvictionFailed { reason } => write!(f, "plan cache eviction failed: {reason}"),
            Self::InvalidConfiguration { field, value } => write!(
                f,
                "invalid plan cache configuration: field='{field}', value='{value}'"
            ),
        }
    }
}

impl std::error::Error for CacheError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_too_large_message() {
        let err = CacheError::EntryTooLarge {
            key: "k".to_string(),
            size: 1024,
            max_size: 512,
        };
        let msg = err.to_string();
        assert!(msg.contains("too large"));
        assert!(msg.contains("1024"));
    }

    #[test]
    fn error_equality() {
        let a = CacheError::EvictionFailed {
            reason: "locked".to_string(),
        };
        let b = CacheError::EvictionFailed {
            reason: "locked".to_string(),
        };
        assert_eq!(a, b);
    }

    #[test]
    fn boxed_error_trait() {
        let err: Box<dyn std::error::Error> = Box::new(CacheError::InvalidConfiguration {
            field: "max_entries".to_string(),
            value: "0".to_string(),
        });
        assert!(err.to_string().contains("max_entries"));
    }
}
