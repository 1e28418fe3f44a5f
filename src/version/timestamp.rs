//! Timestamp parsing shared by upstream rows and date bounds

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Parses an upstream date value
///
/// Strings go through [`parse_timestamp_str`]; numbers are epoch seconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => {
            let seconds = n.as_f64()?;
            DateTime::from_timestamp(seconds.trunc() as i64, (seconds.fract() * 1e9) as u32)
        }
        _ => None,
    }
}

/// Parses RFC 3339, `YYYY-MM-DD HH:MM[:SS]` (UTC), `YYYY-MM-DD` (midnight UTC)
/// or epoch seconds
pub fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
    }
    if let Ok(seconds) = s.parse::<i64>() {
        return DateTime::from_timestamp(seconds, 0);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("2023-06-01T12:30:00Z", "2023-06-01T12:30:00+00:00")]
    #[case("2023-06-01T12:30:00-07:00", "2023-06-01T19:30:00+00:00")]
    #[case("2023-06-01 12:30:00", "2023-06-01T12:30:00+00:00")]
    #[case("2023-06-01 12:30", "2023-06-01T12:30:00+00:00")]
    #[case("2023-06-01T12:30:00.123456", "2023-06-01T12:30:00.123456+00:00")]
    #[case("2023-06-01", "2023-06-01T00:00:00+00:00")]
    #[case("1685622600", "2023-06-01T12:30:00+00:00")]
    fn parse_timestamp_str_accepts_known_formats(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(
            parse_timestamp_str(input).map(|dt| dt.to_rfc3339()),
            Some(expected.to_string())
        );
    }

    #[test]
    fn parse_timestamp_str_rejects_garbage() {
        assert_eq!(parse_timestamp_str("yesterday"), None);
    }

    #[test]
    fn parse_timestamp_reads_epoch_numbers() {
        assert_eq!(
            parse_timestamp(&json!(1685622600.5)).map(|dt| dt.to_rfc3339()),
            Some("2023-06-01T12:30:00.500+00:00".to_string())
        );
        assert_eq!(parse_timestamp(&json!(null)), None);
    }
}
