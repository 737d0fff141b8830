//! Timestamp utilities.

use chrono::{DateTime, SecondsFormat, Utc};

/// A UTC timestamp.
pub type Timestamp = DateTime<Utc>;

/// Returns the current UTC time as an RFC 3339 string with millisecond
/// precision, e.g. `2025-01-01T12:00:00.000Z`.
#[must_use]
pub fn iso_timestamp() -> String {
    now_utc().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Returns the current UTC timestamp.
#[must_use]
pub fn now_utc() -> Timestamp {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_timestamp_round_trips() {
        let ts = iso_timestamp();
        let parsed = DateTime::parse_from_rfc3339(&ts);
        assert!(parsed.is_ok(), "not RFC 3339: {ts}");
    }
}
