#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **chronolog-types** – Core data model for the chronolog event log.
//!
//! This crate defines the in-memory representations shared across the
//! chronolog stack: event records with their opaque identifiers, the shortcut
//! configuration, and the canonical timestamp handling. It is a leaf crate
//! with no I/O concerns; the on-disk encoding of these types lives in
//! `chronolog-codec`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod time;

//─────────────────────────────
//  Event identity
//─────────────────────────────

/// Opaque identifier of an event record.
///
/// Identifiers are compared, hashed, and ordered by their string value and
/// are immutable after creation. The only invariant enforced here is
/// non-emptiness; everything else about the identifier is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId {
    identifier: String,
}

/// Error returned when an event identifier fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("event identifier must be a non-empty string")]
pub struct InvalidEventId;

impl EventId {
    /// Create an identifier from a non-empty string.
    pub fn new(identifier: impl Into<String>) -> Result<Self, InvalidEventId> {
        let identifier = identifier.into();
        if identifier.is_empty() {
            return Err(InvalidEventId);
        }
        Ok(Self { identifier })
    }

    /// The underlying identifier string.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier)
    }
}

//─────────────────────────────
//  Event records
//─────────────────────────────

/// Identity of the program instance that recorded an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creator {
    /// Human-readable program name.
    pub name: String,
    /// Unique identifier of the running instance.
    pub uuid: String,
    /// Program version string.
    pub version: String,
}

impl Creator {
    /// Build a creator for the current process, minting a fresh instance id.
    pub fn current(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uuid: Uuid::new_v4().to_string(),
            version: version.into(),
        }
    }
}

/// A single entry of the event log.
///
/// Events are immutable once committed; the only sanctioned way to change one
/// is to delete its id and add a replacement within a transaction. The
/// `original` field keeps the raw input exactly as the user produced it while
/// `input` carries the processed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Stable identifier for the life of the log.
    pub id: EventId,
    /// Absolute point in time the event refers to.
    pub date: DateTime<Utc>,
    /// Unmodified raw input.
    pub original: String,
    /// Processed input.
    pub input: String,
    /// Non-empty event kind; serialized under the `type` key.
    pub kind: String,
    /// Free-form description.
    pub description: String,
    /// Modifier map; key order carries no meaning.
    pub modifiers: BTreeMap<String, String>,
    /// Program instance that recorded the event.
    pub creator: Creator,
}

//─────────────────────────────
//  Configuration
//─────────────────────────────

/// A `(pattern, replacement, description?)` substitution rule.
///
/// The store persists shortcuts verbatim and never interprets them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    /// Pattern to match.
    pub pattern: String,
    /// Replacement text.
    pub replacement: String,
    /// Optional human-readable description.
    pub description: Option<String>,
}

/// The event-log configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Help text shown to users by higher layers.
    pub help: String,
    /// Shortcut rules; order is significant and preserved.
    pub shortcuts: Vec<Shortcut>,
}
