//! # Temporal Types: UTC-Only Timestamps
//!
//! Defines [`Timestamp`], a UTC timestamp truncated to seconds. Credential
//! issue and expiry times, action timestamps and expiry sweeps all use it,
//! so comparisons never mix precisions or offsets.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A UTC-only timestamp, truncated to seconds precision.
///
/// Serializes as ISO 8601 with a `Z` suffix (e.g. `2026-01-15T12:00:00Z`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current UTC time, truncated.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse an RFC 3339 timestamp, converting any offset to UTC.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| ValidationError::InvalidTimestamp {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// This timestamp shifted forward by whole days. Fails when the result
    /// falls outside chrono's representable range.
    pub fn plus_days(&self, days: u32) -> Result<Self, ValidationError> {
        self.0
            .checked_add_signed(Duration::days(i64::from(days)))
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidTimestamp {
                value: self.to_iso8601(),
                reason: format!("adding {days} days overflows the representable range"),
            })
    }

    /// Render as ISO 8601 with Z suffix.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_utc(dt)
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn now_has_no_subseconds() {
        assert_eq!(Timestamp::now().as_datetime().nanosecond(), 0);
    }

    #[test]
    fn from_utc_truncates() {
        let dt = Utc
            .with_ymd_and_hms(2026, 1, 15, 12, 30, 45)
            .unwrap()
            .with_nanosecond(123_456_789)
            .unwrap();
        assert_eq!(Timestamp::from_utc(dt).to_iso8601(), "2026-01-15T12:30:45Z");
    }

    #[test]
    fn parse_converts_offsets() {
        let ts = Timestamp::parse("2026-01-15T17:00:00+05:00").unwrap();
        assert_eq!(ts.to_iso8601(), "2026-01-15T12:00:00Z");
        assert!(Timestamp::parse("yesterday").is_err());
    }

    #[test]
    fn plus_days_crosses_leap_year() {
        let ts = Timestamp::parse("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(ts.plus_days(365).unwrap().to_iso8601(), "2025-01-14T10:30:00Z");
    }

    #[test]
    fn ordering_follows_time() {
        let a = Timestamp::parse("2024-01-15T10:30:00Z").unwrap();
        let b = a.plus_days(1).unwrap();
        assert!(a < b);
    }

    #[test]
    fn serde_round_trip_has_z_suffix() {
        let ts = Timestamp::parse("2026-06-30T23:59:59Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2026-06-30T23:59:59Z\"");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn plus_days_overflow_is_an_error() {
        let ts = Timestamp::now();
        assert!(matches!(
            ts.plus_days(u32::MAX),
            Err(ValidationError::InvalidTimestamp { .. })
        ));
    }
}
