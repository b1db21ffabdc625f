//! On-disk codec for the configuration document.
//!
//! Disk shape: an object with a string `help` field and a `shortcuts` array.
//! Each shortcut is an ordered tuple `[pattern, replacement, description?]`
//! of two or three strings; tuple order inside the array is significant and
//! preserved.

use serde_json::{json, Value};

use chronolog_types::{Config, Shortcut};

use crate::error::{shape_of, SchemaError};
use crate::fields::{require_object, require_str};

/// Encode a configuration into its on-disk value.
pub fn serialize(config: &Config) -> Value {
    let shortcuts: Vec<Value> = config
        .shortcuts
        .iter()
        .map(|shortcut| {
            let mut tuple = vec![
                Value::String(shortcut.pattern.clone()),
                Value::String(shortcut.replacement.clone()),
            ];
            if let Some(description) = &shortcut.description {
                tuple.push(Value::String(description.clone()));
            }
            Value::Array(tuple)
        })
        .collect();

    json!({
        "help": config.help,
        "shortcuts": shortcuts,
    })
}

/// Validate an on-disk value and decode it into a [`Config`].
pub fn try_deserialize(value: &Value) -> Result<Config, SchemaError> {
    let obj = require_object(value)?;

    let help = require_str(obj, "help")?.to_string();

    let shortcuts_value = match obj.get("shortcuts") {
        None => return Err(SchemaError::MissingField { field: "shortcuts" }),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(SchemaError::InvalidType {
                field: "shortcuts",
                expected: "an array",
                actual: shape_of(other),
                value: other.clone(),
            });
        }
    };

    let mut shortcuts = Vec::with_capacity(shortcuts_value.len());
    for (index, entry) in shortcuts_value.iter().enumerate() {
        shortcuts.push(shortcut_from(index, entry)?);
    }

    Ok(Config { help, shortcuts })
}

fn shortcut_from(index: usize, entry: &Value) -> Result<Shortcut, SchemaError> {
    let invalid = |reason: String| SchemaError::InvalidArrayElement {
        array_field: "shortcuts",
        index,
        reason,
    };

    let tuple = match entry {
        Value::Array(tuple) => tuple,
        other => return Err(invalid(format!("expected a tuple, got {}", shape_of(other)))),
    };
    if tuple.len() < 2 || tuple.len() > 3 {
        return Err(invalid(format!(
            "expected 2 or 3 elements, got {}",
            tuple.len()
        )));
    }

    let element_str = |position: usize| match &tuple[position] {
        Value::String(s) => Ok(s.clone()),
        other => Err(invalid(format!(
            "element {position} must be a string, got {}",
            shape_of(other)
        ))),
    };

    Ok(Shortcut {
        pattern: element_str(0)?,
        replacement: element_str(1)?,
        description: if tuple.len() == 3 {
            Some(element_str(2)?)
        } else {
            None
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Config {
        Config {
            help: "prefix input with a shortcut pattern".to_string(),
            shortcuts: vec![
                Shortcut {
                    pattern: "w".to_string(),
                    replacement: "work".to_string(),
                    description: Some("work entries".to_string()),
                },
                Shortcut {
                    pattern: "g".to_string(),
                    replacement: "gym".to_string(),
                    description: None,
                },
            ],
        }
    }

    #[test]
    fn round_trips_preserving_shortcut_order() {
        let config = sample_config();
        let value = serialize(&config);
        assert_eq!(try_deserialize(&value).unwrap(), config);
        assert_eq!(serialize(&try_deserialize(&value).unwrap()), value);
    }

    #[test]
    fn two_element_tuples_have_no_description() {
        let value = serialize(&sample_config());
        assert_eq!(value["shortcuts"][0], json!(["w", "work", "work entries"]));
        assert_eq!(value["shortcuts"][1], json!(["g", "gym"]));
    }

    #[test]
    fn short_tuple_is_rejected_with_index() {
        let value = json!({"help": "", "shortcuts": [["w", "work"], ["lonely"]]});
        match try_deserialize(&value).unwrap_err() {
            SchemaError::InvalidArrayElement {
                array_field: "shortcuts",
                index,
                ..
            } => assert_eq!(index, 1),
            other => panic!("expected InvalidArrayElement, got {other:?}"),
        }
    }

    #[test]
    fn oversized_tuple_is_rejected() {
        let value = json!({"help": "", "shortcuts": [["a", "b", "c", "d"]]});
        match try_deserialize(&value).unwrap_err() {
            SchemaError::InvalidArrayElement { index: 0, reason, .. } => {
                assert!(reason.contains("expected 2 or 3 elements"));
            }
            other => panic!("expected InvalidArrayElement, got {other:?}"),
        }
    }

    #[test]
    fn non_string_element_is_rejected_left_to_right() {
        let value = json!({"help": "", "shortcuts": [["w", 7], [3, "x"]]});
        match try_deserialize(&value).unwrap_err() {
            SchemaError::InvalidArrayElement { index: 0, reason, .. } => {
                assert!(reason.contains("element 1"));
            }
            other => panic!("expected InvalidArrayElement, got {other:?}"),
        }
    }

    #[test]
    fn help_must_be_a_string() {
        let value = json!({"help": 5, "shortcuts": []});
        match try_deserialize(&value).unwrap_err() {
            SchemaError::InvalidType { field: "help", .. } => {}
            other => panic!("expected InvalidType for help, got {other:?}"),
        }
    }
}
