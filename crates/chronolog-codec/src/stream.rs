//! Decoder for streams of concatenated top-level JSON values.
//!
//! `data.json` holds zero or more pretty-printed objects separated by
//! newlines, so a line-oriented reader cannot parse it. The decoder here
//! consumes one self-delimiting value at a time, skipping inter-value
//! whitespace, which handles any mix of compact and multi-line formatting.

use serde_json::de::StrRead;
use serde_json::{StreamDeserializer, Value};

use chronolog_fs::{ExistingFile, FileReader};

use crate::error::StreamError;

/// Lazy iterator over the JSON values concatenated in `text`.
///
/// Yields each decoded value in order; on malformed input it yields one
/// [`StreamError::Parse`] carrying the byte offset and stops.
pub struct JsonStream<'a> {
    inner: StreamDeserializer<'a, StrRead<'a>, Value>,
    failed: bool,
}

impl<'a> Iterator for JsonStream<'a> {
    type Item = Result<Value, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let offset = self.inner.byte_offset();
        match self.inner.next()? {
            Ok(value) => Some(Ok(value)),
            Err(source) => {
                self.failed = true;
                Some(Err(StreamError::Parse { offset, source }))
            }
        }
    }
}

/// Decode zero or more concatenated JSON values from `text`.
///
/// Empty and whitespace-only input produce an empty stream.
pub fn decode_stream(text: &str) -> JsonStream<'_> {
    JsonStream {
        inner: serde_json::Deserializer::from_str(text).into_iter(),
        failed: false,
    }
}

/// Read a checked file and decode every JSON value it contains.
///
/// An unreadable file surfaces as [`StreamError::Io`]; malformed content as
/// [`StreamError::Parse`]. The two are never conflated.
pub async fn read_objects(
    reader: &dyn FileReader,
    file: &ExistingFile,
) -> Result<Vec<Value>, StreamError> {
    let text = reader.read_to_string(file).await?;
    decode_stream(&text).collect()
}
