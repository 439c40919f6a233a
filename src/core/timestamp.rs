//! Timestamp formatting utilities
//!
//! Renders entry timestamps (millisecond precision) and the compact stamp
//! substituted into rotated file names.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// strftime pattern used for the `{timestamp}` slot of rotated file names
pub const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Timestamp format options for rendered entries
///
/// # Examples
///
/// ```
/// use batchlog::core::TimestampFormat;
/// use chrono::Utc;
///
/// let format = TimestampFormat::Iso8601;
/// let timestamp = format.format(&Utc::now());
/// assert!(timestamp.ends_with('Z'));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    /// ISO 8601 UTC with milliseconds: `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,

    /// Local wall-clock time with milliseconds: `2025-01-08 11:30:45.123`
    LocalMillis,

    /// RFC 3339 format: `2025-01-08T10:30:45.123+00:00`
    Rfc3339,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Custom strftime format
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::LocalMillis => datetime
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S%.3f")
                .to_string(),
            TimestampFormat::Rfc3339 => {
                datetime.to_rfc3339_opts(chrono::SecondsFormat::Millis, false)
            }
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(format_str) => {
                let mut out = String::new();
                if write!(out, "{}", datetime.format(format_str)).is_err() {
                    return TimestampFormat::Iso8601.format(datetime);
                }
                out
            }
        }
    }

    /// Whether a custom strftime pattern is well formed; built-in formats always are
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self {
            TimestampFormat::Custom(format_str) => {
                !StrftimeItems::new(format_str).any(|item| matches!(item, Item::Error))
            }
            _ => true,
        }
    }

    /// Check if this is a numeric format
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, TimestampFormat::UnixMillis)
    }
}

/// Render the `{timestamp}` slot for a rotated file name
#[must_use]
pub fn file_stamp(now: &DateTime<Local>) -> String {
    now.format(FILE_STAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_datetime() -> DateTime<Utc> {
        // 2025-01-08 10:30:45.123 UTC
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::milliseconds(123)
    }

    #[test]
    fn test_iso8601_format() {
        let result = TimestampFormat::Iso8601.format(&fixed_datetime());
        assert_eq!(result, "2025-01-08T10:30:45.123Z");
    }

    #[test]
    fn test_rfc3339_format() {
        let result = TimestampFormat::Rfc3339.format(&fixed_datetime());
        assert_eq!(result, "2025-01-08T10:30:45.123+00:00");
    }

    #[test]
    fn test_unix_millis_format() {
        let result = TimestampFormat::UnixMillis.format(&fixed_datetime());
        assert_eq!(result, "1736332245123");
        assert!(TimestampFormat::UnixMillis.is_numeric());
    }

    #[test]
    fn test_custom_format() {
        let format = TimestampFormat::Custom("%Y/%m/%d %H:%M".to_string());
        assert_eq!(format.format(&fixed_datetime()), "2025/01/08 10:30");
    }

    #[test]
    fn test_invalid_custom_format_falls_back() {
        let format = TimestampFormat::Custom("%Q".to_string());
        assert!(!format.is_valid());
        assert_eq!(format.format(&fixed_datetime()), "2025-01-08T10:30:45.123Z");
        assert!(TimestampFormat::Custom("%H:%M".to_string()).is_valid());
        assert!(TimestampFormat::Iso8601.is_valid());
    }

    #[test]
    fn test_file_stamp() {
        let local = Local.with_ymd_and_hms(2025, 1, 8, 9, 5, 3).single().unwrap();
        assert_eq!(file_stamp(&local), "20250108_090503");
    }

    #[test]
    fn test_deserialization() {
        let format: TimestampFormat = serde_json::from_str("\"local_millis\"").unwrap();
        assert_eq!(format, TimestampFormat::LocalMillis);

        let format: TimestampFormat = serde_json::from_str(r#"{"custom":"%Y-%m-%d"}"#).unwrap();
        assert_eq!(format, TimestampFormat::Custom("%Y-%m-%d".to_string()));
    }
}
