//! Repository layer: table-scoped SQLite operations.

mod medication_record;
mod pill;

use chrono::{DateTime, SecondsFormat, Utc};

use super::DatabaseError;

pub use medication_record::*;
pub use pill::*;

/// Timestamps are stored as RFC 3339 UTC with millisecond precision so that
/// lexical order on the TEXT column matches chronological order.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(value: &str, field: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::ConstraintViolation(format!("invalid {field} '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_format_is_fixed_width_utc() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 16, 7, 5, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "2026-10-16T07:05:00.000Z");
    }

    #[test]
    fn timestamp_round_trips() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let parsed = parse_timestamp(&format_timestamp(&ts), "taken_at").unwrap();
        assert_eq!(parsed, ts);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = parse_timestamp("yesterday", "taken_at").unwrap_err();
        assert!(err.to_string().contains("taken_at"), "Error: {err}");
    }
}
