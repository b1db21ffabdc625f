//! Typed failures for schema validation and stream decoding.
//!
//! Schema errors are values: `try_deserialize` returns them, nothing throws.
//! Stream errors distinguish an unreadable file from malformed JSON so
//! callers can react differently to the two.

use serde_json::Value;
use thiserror::Error;

use chronolog_fs::FsError;

/// Structured description of the first schema violation found in a value.
///
/// Validation walks fields in their declared order and array elements left to
/// right, so exactly one of these describes any invalid document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// A required field is absent.
    #[error("missing required field `{field}`")]
    MissingField {
        /// Name of the absent field.
        field: &'static str,
    },

    /// A field is present but has the wrong JSON shape.
    #[error("field `{field}` must be {expected}, got {actual}: {value}")]
    InvalidType {
        /// Name of the offending field.
        field: &'static str,
        /// The shape the schema requires.
        expected: &'static str,
        /// The shape actually found.
        actual: &'static str,
        /// The offending value.
        value: Value,
    },

    /// A field has the right shape but its content is out of domain.
    #[error("field `{field}` has invalid value {value}: {reason}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// The offending value.
        value: Value,
        /// Why the content was rejected.
        reason: String,
    },

    /// The top-level value is not an object (or is null).
    #[error("expected a JSON object, got {actual}")]
    InvalidStructure {
        /// The shape actually found at top level.
        actual: &'static str,
    },

    /// An element of an array field failed its own validation.
    #[error("`{array_field}[{index}]` is invalid: {reason}")]
    InvalidArrayElement {
        /// Name of the array field.
        array_field: &'static str,
        /// Zero-based index of the bad element.
        index: usize,
        /// Why the element was rejected.
        reason: String,
    },

    /// A subfield of a composite field failed validation.
    #[error("`{parent_field}.{nested_field}` is invalid: {reason}")]
    NestedFieldError {
        /// Name of the composite field.
        parent_field: &'static str,
        /// Name of the failing subfield.
        nested_field: String,
        /// Why the subfield was rejected.
        reason: String,
    },
}

/// The JSON shape of a value, for error messages.
pub(crate) fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Failures while decoding a stream of concatenated JSON values.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The file could not be read at all.
    #[error("failed to read value stream: {0}")]
    Io(#[from] FsError),

    /// The byte stream is not a sequence of valid JSON values.
    #[error("malformed JSON at byte {offset}: {source}")]
    Parse {
        /// Byte offset where decoding stopped.
        offset: usize,
        /// Underlying decoder error.
        #[source]
        source: serde_json::Error,
    },
}
