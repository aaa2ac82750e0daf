//! Tagged representation of parsed/schema values (spec §9: replace the
//! dynamic "any" bag with an explicit variant).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A parsed field value, or a schema-descriptor default. Deliberately
/// mirrors JSON's shape rather than a type-erased `Box<dyn Any>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent value. Distinct from an empty string.
    Null,
    /// A resolved string value (the common case: most validation types
    /// serialize to their string form, e.g. currency `"$1,234.56"`).
    String(String),
    /// A resolved numeric value.
    Number(f64),
    /// A resolved boolean value.
    Bool(bool),
    /// A resolved list of values (e.g. `string_array`, `number_array`).
    List(Vec<Value>),
    /// A resolved nested object (validation type `object`).
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// True if this is `Value::Null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the string form if this is `Value::String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Convert a `serde_json::Value` into our tagged variant.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(arr) => {
                Value::List(arr.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(obj) => Value::Map(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to a plain `serde_json::Value` for wire serialization.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let original = serde_json::json!({"name": "Ada", "age": 36, "tags": ["a", "b"]});
        let value = Value::from_json(&original);
        assert_eq!(value.to_json(), original);
    }

    #[test]
    fn null_is_distinct_from_empty_string() {
        assert!(Value::Null.is_null());
        assert!(!Value::String(String::new()).is_null());
    }
}
