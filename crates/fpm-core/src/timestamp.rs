//! Lenient timestamp (de)serialization
//!
//! Documents are written with RFC 3339 timestamps. Documents produced by
//! older tooling carry `YYYY-MM-DD HH:MM:SS` wall-clock strings instead; those
//! are accepted and interpreted as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

const LEGACY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse either an RFC 3339 or a legacy wall-clock timestamp.
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, LEGACY_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339())
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_rfc3339() {
        let ts = parse("2025-03-01T10:20:30+02:00").unwrap();
        assert_eq!(ts.hour(), 8);
    }

    #[test]
    fn parses_legacy_wall_clock() {
        let ts = parse("2025-03-01 10:20:30").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2025, 3, 1));
        assert_eq!(ts.minute(), 20);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("yesterday").is_none());
    }
}
