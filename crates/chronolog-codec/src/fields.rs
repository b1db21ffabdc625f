//! Field-extraction helpers shared by the entity codecs.

use serde_json::{Map, Value};

use crate::error::{shape_of, SchemaError};

/// The object form of a top-level value, or `InvalidStructure`.
pub(crate) fn require_object(value: &Value) -> Result<&Map<String, Value>, SchemaError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(SchemaError::InvalidStructure {
            actual: shape_of(other),
        }),
    }
}

/// A required string field, or `MissingField` / `InvalidType`.
pub(crate) fn require_str<'a>(
    obj: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, SchemaError> {
    match obj.get(field) {
        None => Err(SchemaError::MissingField { field }),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(SchemaError::InvalidType {
            field,
            expected: "a string",
            actual: shape_of(other),
            value: other.clone(),
        }),
    }
}

/// A required object field, or `MissingField` / `InvalidType`.
pub(crate) fn require_map<'a>(
    obj: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Map<String, Value>, SchemaError> {
    match obj.get(field) {
        None => Err(SchemaError::MissingField { field }),
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(SchemaError::InvalidType {
            field,
            expected: "an object",
            actual: shape_of(other),
            value: other.clone(),
        }),
    }
}

/// A string subfield of a composite field, or `NestedFieldError`.
pub(crate) fn require_nested_str<'a>(
    parent: &'static str,
    obj: &'a Map<String, Value>,
    field: &str,
) -> Result<&'a str, SchemaError> {
    match obj.get(field) {
        None => Err(SchemaError::NestedFieldError {
            parent_field: parent,
            nested_field: field.to_string(),
            reason: "missing required field".to_string(),
        }),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(SchemaError::NestedFieldError {
            parent_field: parent,
            nested_field: field.to_string(),
            reason: format!("expected a string, got {}", shape_of(other)),
        }),
    }
}
