#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **chronolog-codec** – On-disk encoding for the chronolog event log.
//!
//! Two concerns live here. The [`stream`] module decodes files containing
//! zero or more concatenated top-level JSON values - the shape of `data.json`,
//! where each event is a tab-indented pretty-printed object followed by a
//! newline. The [`event`] and [`config`] modules validate those generic
//! values against the on-disk schema, reporting the first failure as a
//! structured [`SchemaError`] value rather than an exception.
//!
//! Serialization is total; validation runs in declared field order and stops
//! at the first offending field, with array elements checked left to right.

use serde::ser::Error as _;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

pub mod config;
mod error;
pub mod event;
mod fields;
pub mod stream;

pub use error::{SchemaError, StreamError};

/// Render a JSON value with tab indentation.
///
/// This is the exact formatting the store writes to `data.json` and
/// `config.json`; the decoder in [`stream`] accepts it back without any
/// line-orientation assumption.
pub fn to_tab_json(value: &Value) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(serde_json::Error::custom)
}
