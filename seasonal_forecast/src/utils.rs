//! Utility functions for the seasonal_forecast crate

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, DurationRound, NaiveDate, NaiveDateTime, Utc};

/// Create hourly timestamps following `last_timestamp`
pub fn future_hourly_timestamps(
    last_timestamp: DateTime<Utc>,
    horizon: usize,
) -> Vec<DateTime<Utc>> {
    (1..=horizon as i64)
        .map(|k| last_timestamp + Duration::hours(k))
        .collect()
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Drop minutes, seconds and sub-seconds
pub fn truncate_to_hour(timestamp: DateTime<Utc>) -> Result<DateTime<Utc>> {
    timestamp
        .duration_trunc(Duration::hours(1))
        .map_err(|e| ForecastError::MathError(format!("Cannot truncate {}: {}", timestamp, e)))
}

/// Parse a reading timestamp.
///
/// Accepts RFC 3339 (any offset), or naive `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS` and `YYYY-MM-DD` which are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| ForecastError::ParseError(format!("Invalid timestamp '{}': {}", raw, e)))?;

    Ok(date.and_time(chrono::NaiveTime::default()).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(12.345_6, 2), 12.35);
        assert_eq!(round_to(-0.004, 2), -0.0);
        assert_eq!(round_to(7.0, 0), 7.0);
    }

    #[test]
    fn test_truncate_to_hour() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 13, 47, 12).unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap();
        assert_eq!(truncate_to_hour(ts).unwrap(), expected);
    }
}
