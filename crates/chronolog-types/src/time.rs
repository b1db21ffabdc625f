//! Canonical timestamp text handling.
//!
//! Event dates travel on disk as RFC-1123 UTC strings
//! (`"Thu, 23 May 2025 12:00:00 GMT"`). The writer always emits that exact
//! canonical form; the parser accepts any variant an RFC-1123 printer might
//! produce, which chrono's RFC 2822 grammar covers (numeric offsets, `GMT`,
//! `UT`, single-digit days).

use chrono::{DateTime, Utc};

/// Error returned when a timestamp string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{input}` is not a valid RFC-1123 timestamp: {source}")]
pub struct InvalidTimestamp {
    /// The rejected input text.
    pub input: String,
    /// Underlying chrono parse failure.
    #[source]
    pub source: chrono::ParseError,
}

/// Render a timestamp as the canonical RFC-1123 UTC string.
pub fn format_rfc1123(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parse an RFC-1123 timestamp, normalizing to UTC.
pub fn parse_rfc1123(input: &str) -> Result<DateTime<Utc>, InvalidTimestamp> {
    DateTime::parse_from_rfc2822(input)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|source| InvalidTimestamp {
            input: input.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_canonical_utc() {
        let date = Utc.with_ymd_and_hms(2025, 5, 23, 12, 0, 0).unwrap();
        assert_eq!(format_rfc1123(&date), "Fri, 23 May 2025 12:00:00 GMT");
    }

    #[test]
    fn round_trips_through_text() {
        let date = Utc.with_ymd_and_hms(2025, 5, 12, 8, 30, 17).unwrap();
        let text = format_rfc1123(&date);
        assert_eq!(parse_rfc1123(&text).unwrap(), date);
    }

    #[test]
    fn accepts_printer_variants() {
        // Numeric offset and obsolete zone names both normalize to UTC.
        let canonical = parse_rfc1123("Fri, 23 May 2025 12:00:00 GMT").unwrap();
        assert_eq!(
            parse_rfc1123("Fri, 23 May 2025 12:00:00 +0000").unwrap(),
            canonical
        );
        assert_eq!(
            parse_rfc1123("Fri, 23 May 2025 14:00:00 +0200").unwrap(),
            canonical
        );
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_rfc1123("not a date").unwrap_err();
        assert_eq!(err.input, "not a date");
    }
}
