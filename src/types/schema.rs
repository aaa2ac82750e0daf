//! Caller-supplied output schema: a mapping from field name to a typed
//! descriptor (spec §3, `outputSchema`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The validation type a `SearchStep`/schema field declares, per spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationType {
    String,
    Number,
    Boolean,
    Email,
    Phone,
    Date,
    IsoDate,
    Url,
    StringArray,
    NumberArray,
    Currency,
    Percentage,
    Address,
    Name,
    Object,
    Custom,
}

impl ValidationType {
    /// Every supported validation type, in a stable order.
    #[must_use]
    pub fn all() -> &'static [ValidationType] {
        use ValidationType::*;
        &[
            String, Number, Boolean, Email, Phone, Date, IsoDate, Url, StringArray, NumberArray,
            Currency, Percentage, Address, Name, Object, Custom,
        ]
    }

    /// Default confidence floor applied when a resolver does not report one
    /// explicitly (spec §4.6, "Default per validation type").
    #[must_use]
    pub fn default_confidence_floor(self) -> f64 {
        match self {
            ValidationType::Email | ValidationType::IsoDate | ValidationType::Url => 0.55,
            ValidationType::Currency | ValidationType::Percentage | ValidationType::Phone => 0.5,
            ValidationType::Date | ValidationType::Name | ValidationType::Address => 0.45,
            ValidationType::Number | ValidationType::Boolean => 0.5,
            ValidationType::StringArray | ValidationType::NumberArray | ValidationType::Object => {
                0.4
            }
            ValidationType::String | ValidationType::Custom => 0.4,
        }
    }
}

/// One field's descriptor within a caller-supplied output schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// The declared validation type.
    pub validation_type: ValidationType,
    /// Human-readable description used to seed the planner's search instruction.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the field must resolve for the parse to be considered `success=true`.
    #[serde(default = "default_required")]
    pub is_required: bool,
    /// Fallback value substituted when the field cannot be resolved (optional).
    #[serde(default)]
    pub fallback_value: Option<super::value::Value>,
}

fn default_required() -> bool {
    true
}

impl FieldDescriptor {
    /// Build a descriptor with only a validation type; other fields default
    /// (required, no description, no fallback).
    #[must_use]
    pub fn new(validation_type: ValidationType) -> Self {
        Self {
            validation_type,
            description: None,
            is_required: true,
            fallback_value: None,
        }
    }
}

/// The caller-supplied output schema: field name → descriptor. A `BTreeMap`
/// keeps iteration order stable and lexical, which cache-key derivation
/// (spec §4.6, "canonical JSON of schema with sorted keys") depends on.
pub type OutputSchema = BTreeMap<String, FieldDescriptor>;

/// Flatten a schema's keys, expanding nested `object`-typed descriptors
/// lexically (spec invariant 1: "nested objects expand lexically before
/// cache-key derivation"). Only `Object`-typed fields with a nested schema
/// in their description are relevant here; this crate does not currently
/// carry a nested-schema payload, so flattening is a no-op beyond
/// top-level keys. Kept as a named function so cache-key derivation and the
/// planner share one expansion rule.
#[must_use]
pub fn flattened_keys(schema: &OutputSchema) -> Vec<String> {
    schema.keys().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_keys_are_sorted() {
        let mut schema = OutputSchema::new();
        schema.insert("zeta".to_string(), FieldDescriptor::new(ValidationType::String));
        schema.insert("alpha".to_string(), FieldDescriptor::new(ValidationType::String));
        assert_eq!(flattened_keys(&schema), vec!["alpha", "zeta"]);
    }

    #[test]
    fn default_descriptor_is_required() {
        let descriptor = FieldDescriptor::new(ValidationType::Email);
        assert!(descriptor.is_required);
        assert!(descriptor.fallback_value.is_none());
    }
}
