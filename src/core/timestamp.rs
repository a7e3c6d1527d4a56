//! Rendering of the `time` field

use super::error::{LoggerError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Write};

/// How a logger stamps its records.
///
/// Unix variants produce a JSON number, everything else a string.
///
/// ```
/// use fanout_logger::TimestampFormat;
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap();
/// assert_eq!(TimestampFormat::Rfc3339.format(&at), "2025-01-08T10:30:45Z");
/// assert_eq!(TimestampFormat::Unix.to_json_value(&at), 1736332245i64);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// `2025-01-08T10:30:45Z`
    #[default]
    Rfc3339,
    /// `2025-01-08T10:30:45.123Z`
    Iso8601,
    /// `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,
    Unix,
    UnixMillis,
    UnixMicros,
    /// strftime pattern, always rendered in UTC
    Custom(String),
}

impl TimestampFormat {
    /// Value of the `time` field for `at`
    #[must_use]
    pub fn to_json_value(&self, at: &DateTime<Utc>) -> Value {
        match self {
            TimestampFormat::Unix => Value::from(at.timestamp()),
            TimestampFormat::UnixMillis => Value::from(at.timestamp_millis()),
            TimestampFormat::UnixMicros => Value::from(at.timestamp_micros()),
            TimestampFormat::Rfc3339 => Value::from(at.to_rfc3339_opts(SecondsFormat::Secs, true)),
            TimestampFormat::Iso8601 => Value::from(at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            TimestampFormat::Iso8601Micros => {
                Value::from(at.to_rfc3339_opts(SecondsFormat::Micros, true))
            }
            TimestampFormat::Custom(pattern) => Value::from(
                try_strftime(at, pattern)
                    .unwrap_or_else(|| at.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ),
        }
    }

    /// Same as [`to_json_value`](Self::to_json_value), as text
    #[must_use]
    pub fn format(&self, at: &DateTime<Utc>) -> String {
        match self.to_json_value(at) {
            Value::String(s) => s,
            number => number.to_string(),
        }
    }

    /// Reject a `Custom` pattern chrono cannot render.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] for a bad pattern.
    pub fn validate(&self) -> Result<()> {
        match self {
            TimestampFormat::Custom(pattern) => validate_strftime(pattern),
            _ => Ok(()),
        }
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TimestampFormat::Unix | TimestampFormat::UnixMillis | TimestampFormat::UnixMicros
        )
    }
}

/// Check a strftime pattern once, before it is used on every record.
///
/// # Errors
///
/// Returns [`LoggerError::InvalidConfiguration`] if any specifier is unknown.
pub fn validate_strftime(pattern: &str) -> Result<()> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(LoggerError::config(
            "TimestampFormat",
            format!("invalid strftime pattern '{}'", pattern),
        ));
    }
    Ok(())
}

/// Render `at` with `pattern`, or `None` if chrono refuses the pattern
pub fn try_strftime<Tz>(at: &DateTime<Tz>, pattern: &str) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut out = String::new();
    write!(out, "{}", at.format(pattern)).ok()?;
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap() + chrono::Duration::microseconds(123_456)
    }

    #[test]
    fn test_string_layouts() {
        assert_eq!(TimestampFormat::Rfc3339.format(&at()), "2025-01-08T10:30:45Z");
        assert_eq!(TimestampFormat::Iso8601.format(&at()), "2025-01-08T10:30:45.123Z");
        assert_eq!(
            TimestampFormat::Iso8601Micros.format(&at()),
            "2025-01-08T10:30:45.123456Z"
        );
        assert_eq!(TimestampFormat::Custom("%d/%m".into()).format(&at()), "08/01");
    }

    #[test]
    fn test_unix_variants_are_numbers() {
        assert_eq!(TimestampFormat::Unix.to_json_value(&at()), Value::from(1_736_332_245i64));
        assert_eq!(
            TimestampFormat::UnixMillis.to_json_value(&at()),
            Value::from(1_736_332_245_123i64)
        );
        assert_eq!(TimestampFormat::UnixMicros.format(&at()), "1736332245123456");
        assert!(TimestampFormat::UnixMicros.is_numeric());
        assert!(!TimestampFormat::Custom("%s".into()).is_numeric());
        assert!(TimestampFormat::Rfc3339.to_json_value(&at()).is_string());
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(validate_strftime("%Y-%m-%d %H:%M").is_ok());
        assert!(TimestampFormat::Rfc3339.validate().is_ok());
        assert!(matches!(
            TimestampFormat::Custom("%Q".into()).validate(),
            Err(LoggerError::InvalidConfiguration { .. })
        ));
        assert_eq!(try_strftime(&at(), "%Q"), None);
    }

    #[test]
    fn test_invalid_custom_falls_back_to_rfc3339() {
        let format = TimestampFormat::Custom("%Q".into());
        assert_eq!(format.format(&at()), "2025-01-08T10:30:45Z");
    }

    #[test]
    fn test_deserialize() {
        let format: TimestampFormat = serde_json::from_str(r#"{"Custom":"%Y"}"#).unwrap();
        assert_eq!(format, TimestampFormat::Custom("%Y".into()));
        let format: TimestampFormat = serde_json::from_str(r#""UnixMillis""#).unwrap();
        assert_eq!(format, TimestampFormat::UnixMillis);
    }
}
