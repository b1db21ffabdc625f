//! On-disk codec for event records.
//!
//! Disk shape: an object with string fields `id`, `date` (RFC-1123 UTC),
//! `original`, `input`, `type`, `description`, a string-to-string `modifiers`
//! object, and a `creator` object carrying `name`, `uuid`, and `version`.

use serde_json::{json, Map, Value};

use chronolog_types::{time, Creator, Event, EventId};

use crate::error::{shape_of, SchemaError};
use crate::fields::{require_map, require_nested_str, require_object, require_str};

/// Encode an event into its on-disk value.
pub fn serialize(event: &Event) -> Value {
    let modifiers: Map<String, Value> = event
        .modifiers
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();

    json!({
        "id": event.id.identifier(),
        "date": time::format_rfc1123(&event.date),
        "original": event.original,
        "input": event.input,
        "type": event.kind,
        "description": event.description,
        "modifiers": modifiers,
        "creator": {
            "name": event.creator.name,
            "uuid": event.creator.uuid,
            "version": event.creator.version,
        },
    })
}

/// Validate an on-disk value and decode it into an [`Event`].
///
/// Returns the first violation found, walking fields in declared order.
pub fn try_deserialize(value: &Value) -> Result<Event, SchemaError> {
    let obj = require_object(value)?;

    let id_str = require_str(obj, "id")?;
    let id = EventId::new(id_str).map_err(|_| SchemaError::InvalidValue {
        field: "id",
        value: Value::String(id_str.to_string()),
        reason: "identifier must be non-empty".to_string(),
    })?;

    let date_str = require_str(obj, "date")?;
    let date = time::parse_rfc1123(date_str).map_err(|e| SchemaError::InvalidValue {
        field: "date",
        value: Value::String(date_str.to_string()),
        reason: e.to_string(),
    })?;

    let original = require_str(obj, "original")?.to_string();
    let input = require_str(obj, "input")?.to_string();

    let kind = require_str(obj, "type")?;
    if kind.is_empty() {
        return Err(SchemaError::InvalidValue {
            field: "type",
            value: Value::String(String::new()),
            reason: "event type must be non-empty".to_string(),
        });
    }

    let description = require_str(obj, "description")?.to_string();

    let modifiers_obj = require_map(obj, "modifiers")?;
    let mut modifiers = std::collections::BTreeMap::new();
    for (key, entry) in modifiers_obj {
        match entry {
            Value::String(s) => {
                modifiers.insert(key.clone(), s.clone());
            }
            other => {
                return Err(SchemaError::NestedFieldError {
                    parent_field: "modifiers",
                    nested_field: key.clone(),
                    reason: format!("expected a string, got {}", shape_of(other)),
                });
            }
        }
    }

    let creator_obj = require_map(obj, "creator")?;
    let creator = Creator {
        name: require_nested_str("creator", creator_obj, "name")?.to_string(),
        uuid: require_nested_str("creator", creator_obj, "uuid")?.to_string(),
        version: require_nested_str("creator", creator_obj, "version")?.to_string(),
    };

    Ok(Event {
        id,
        date,
        original,
        input,
        kind: kind.to_string(),
        description,
        modifiers,
        creator,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_event() -> Event {
        Event {
            id: EventId::new("event1").unwrap(),
            date: Utc.with_ymd_and_hms(2025, 5, 12, 9, 15, 0).unwrap(),
            original: "work finished the report".to_string(),
            input: "work finished the report".to_string(),
            kind: "work".to_string(),
            description: "finished the report".to_string(),
            modifiers: [("with".to_string(), "alice".to_string())].into(),
            creator: Creator {
                name: "chronolog".to_string(),
                uuid: "d5888b50-7e1e-4729-92d7-bfbd2c9b13e1".to_string(),
                version: "0.1.0".to_string(),
            },
        }
    }

    #[test]
    fn round_trips_through_disk_shape() {
        let event = sample_event();
        let value = serialize(&event);
        assert_eq!(try_deserialize(&value).unwrap(), event);
        // And re-serializing the decoded event reproduces the value.
        assert_eq!(serialize(&try_deserialize(&value).unwrap()), value);
    }

    #[test]
    fn date_is_written_as_rfc1123() {
        let value = serialize(&sample_event());
        assert_eq!(value["date"], "Mon, 12 May 2025 09:15:00 GMT");
        assert_eq!(value["id"], "event1");
        assert_eq!(value["type"], "work");
    }

    #[test]
    fn missing_field_is_reported_first() {
        let mut value = serialize(&sample_event());
        value.as_object_mut().unwrap().remove("type");
        assert_eq!(
            try_deserialize(&value).unwrap_err(),
            SchemaError::MissingField { field: "type" }
        );
    }

    #[test]
    fn first_failure_in_declared_order_wins() {
        // Both `id` and `type` are broken; `id` comes first in field order.
        let mut value = serialize(&sample_event());
        {
            let obj = value.as_object_mut().unwrap();
            obj.insert("id".to_string(), serde_json::json!(42));
            obj.remove("type");
        }
        match try_deserialize(&value).unwrap_err() {
            SchemaError::InvalidType { field: "id", .. } => {}
            other => panic!("expected InvalidType for id, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_date_is_invalid_value() {
        let mut value = serialize(&sample_event());
        value.as_object_mut().unwrap()["date"] = serde_json::json!("tomorrow-ish");
        match try_deserialize(&value).unwrap_err() {
            SchemaError::InvalidValue { field: "date", .. } => {}
            other => panic!("expected InvalidValue for date, got {other:?}"),
        }
    }

    #[test]
    fn non_string_modifier_is_nested_error() {
        let mut value = serialize(&sample_event());
        value.as_object_mut().unwrap()["modifiers"] = serde_json::json!({"count": 3});
        match try_deserialize(&value).unwrap_err() {
            SchemaError::NestedFieldError {
                parent_field: "modifiers",
                nested_field,
                ..
            } => assert_eq!(nested_field, "count"),
            other => panic!("expected NestedFieldError, got {other:?}"),
        }
    }

    #[test]
    fn creator_subfields_are_validated() {
        let mut value = serialize(&sample_event());
        value.as_object_mut().unwrap()["creator"] = serde_json::json!({"name": "chronolog"});
        match try_deserialize(&value).unwrap_err() {
            SchemaError::NestedFieldError {
                parent_field: "creator",
                nested_field,
                ..
            } => assert_eq!(nested_field, "uuid"),
            other => panic!("expected NestedFieldError, got {other:?}"),
        }
    }

    #[test]
    fn top_level_must_be_an_object() {
        assert_eq!(
            try_deserialize(&serde_json::json!(null)).unwrap_err(),
            SchemaError::InvalidStructure { actual: "null" }
        );
        assert_eq!(
            try_deserialize(&serde_json::json!([1, 2])).unwrap_err(),
            SchemaError::InvalidStructure { actual: "an array" }
        );
    }
}
