//! Calendar date/time values
//!
//! Naive (zone-less) datetimes backed by chrono. Arithmetic works in
//! seconds; callers convert time measurements to seconds first.

use crate::{Number, RpnError};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A calendar instant without time zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTimeValue(NaiveDateTime);

impl DateTimeValue {
    pub fn new(inner: NaiveDateTime) -> Self {
        Self(inner)
    }

    /// Parse ISO 8601 style input: `2024-03-01`, `2024-03-01T12:30:00`,
    /// `2024-03-01 12:30`. Slashes are accepted in place of dashes.
    pub fn parse(text: &str) -> Result<Self, RpnError> {
        let text = text.trim().replace('/', "-");

        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(&text, format) {
                return Ok(Self(dt));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
            return Ok(Self(date.and_time(NaiveTime::MIN)));
        }

        Err(RpnError::Parse(format!("'{}' is not a recognized date/time", text)))
    }

    pub fn inner(&self) -> NaiveDateTime {
        self.0
    }

    /// Shift by a (possibly fractional, possibly negative) number of seconds
    pub fn add_seconds(&self, seconds: &Number) -> Result<Self, RpnError> {
        let millis = seconds.mul(&Number::from_i64(1000)).round().to_i64()
            .ok_or(RpnError::Overflow)?;
        self.0.checked_add_signed(Duration::milliseconds(millis))
            .map(Self)
            .ok_or(RpnError::Overflow)
    }

    /// Seconds from `other` to `self`
    pub fn seconds_since(&self, other: &Self) -> Number {
        let delta = self.0.signed_duration_since(other.0);
        Number::from_ratio(delta.num_milliseconds(), 1000)
    }
}

impl fmt::Display for DateTimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        let date = DateTimeValue::parse("2024-03-01").unwrap();
        assert_eq!(date.to_string(), "2024-03-01 00:00:00");

        let full = DateTimeValue::parse("2024-03-01T12:30:15").unwrap();
        assert_eq!(full.to_string(), "2024-03-01 12:30:15");

        let slashed = DateTimeValue::parse("2024/03/01").unwrap();
        assert_eq!(slashed, date);

        assert!(DateTimeValue::parse("2024-13-01").is_err());
    }

    #[test]
    fn test_seconds_arithmetic() {
        let start = DateTimeValue::parse("2024-03-01").unwrap();
        let later = start.add_seconds(&Number::from_i64(90)).unwrap();
        assert_eq!(later.to_string(), "2024-03-01 00:01:30");
        assert_eq!(later.seconds_since(&start), Number::from_i64(90));
    }
}
