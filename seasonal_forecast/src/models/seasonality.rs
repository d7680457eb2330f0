//! Hour-of-day and day-of-week seasonal offsets

use crate::data::TimePoint;
use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Buckets in the daily cycle
pub const HOURS_PER_DAY: usize = 24;
/// Buckets in the weekly cycle
pub const DAYS_PER_WEEK: usize = 7;

/// Zero-mean seasonal offsets.
///
/// Each offset is the mean of the readings falling in that bucket minus the
/// mean of all populated bucket means. Buckets without readings stay at
/// zero, so unseen hours or weekdays add no adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalProfile {
    /// Offsets indexed by local hour, 0..=23
    pub hour_of_day: [f64; HOURS_PER_DAY],
    /// Offsets indexed by local weekday, Sunday = 0 .. Saturday = 6
    pub day_of_week: [f64; DAYS_PER_WEEK],
}

impl SeasonalProfile {
    /// Fit both profiles from raw readings
    pub fn fit(points: &[TimePoint], tz: FixedOffset) -> Self {
        let hour_of_day = bucket_offsets(
            points
                .iter()
                .map(|p| (hour_bucket(p.timestamp, tz), p.value)),
        );
        let day_of_week = bucket_offsets(
            points
                .iter()
                .map(|p| (weekday_bucket(p.timestamp, tz), p.value)),
        );

        Self {
            hour_of_day,
            day_of_week,
        }
    }

    /// Combined hourly and weekly offset at `timestamp`
    pub fn offset_at(&self, timestamp: DateTime<Utc>, tz: FixedOffset) -> f64 {
        self.hour_of_day[hour_bucket(timestamp, tz)]
            + self.day_of_week[weekday_bucket(timestamp, tz)]
    }
}

/// Local hour of `timestamp`
pub fn hour_bucket(timestamp: DateTime<Utc>, tz: FixedOffset) -> usize {
    timestamp.with_timezone(&tz).hour() as usize
}

/// Local weekday of `timestamp`, counted from Sunday
pub fn weekday_bucket(timestamp: DateTime<Utc>, tz: FixedOffset) -> usize {
    timestamp.with_timezone(&tz).weekday().num_days_from_sunday() as usize
}

fn bucket_offsets<const N: usize>(samples: impl Iterator<Item = (usize, f64)>) -> [f64; N] {
    let mut sums = [0.0; N];
    let mut counts = [0usize; N];
    for (bucket, value) in samples {
        sums[bucket] += value;
        counts[bucket] += 1;
    }

    let mut means = [0.0; N];
    let mut populated = 0usize;
    let mut total = 0.0;
    for bucket in 0..N {
        if counts[bucket] > 0 {
            means[bucket] = sums[bucket] / counts[bucket] as f64;
            total += means[bucket];
            populated += 1;
        }
    }

    if populated == 0 {
        return [0.0; N];
    }

    let center = total / populated as f64;
    let mut offsets = [0.0; N];
    for bucket in 0..N {
        if counts[bucket] > 0 {
            offsets[bucket] = means[bucket] - center;
        }
    }

    offsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, Offset, TimeZone};

    fn utc() -> FixedOffset {
        Utc.fix()
    }

    #[test]
    fn test_partial_day_leaves_unseen_hours_at_zero() {
        // 2024-01-07 is a Sunday
        let start = Utc.with_ymd_and_hms(2024, 1, 7, 0, 0, 0).unwrap();
        let points: Vec<TimePoint> = (0..4)
            .map(|h| TimePoint::new(start + Duration::hours(h), 10.0 * h as f64))
            .collect();

        let profile = SeasonalProfile::fit(&points, utc());

        assert_eq!(&profile.hour_of_day[..4], &[-15.0, -5.0, 5.0, 15.0]);
        assert!(profile.hour_of_day[4..].iter().all(|&v| v == 0.0));
        assert_eq!(profile.day_of_week, [0.0; DAYS_PER_WEEK]);
    }

    #[test]
    fn test_offsets_sum_to_zero() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let points: Vec<TimePoint> = (0..200)
            .map(|i| {
                let value = (i as f64 * 0.37).sin() * 12.0 + (i % 5) as f64;
                TimePoint::new(start + Duration::hours(i), value)
            })
            .collect();

        let profile = SeasonalProfile::fit(&points, utc());

        assert_relative_eq!(profile.hour_of_day.iter().sum::<f64>(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(profile.day_of_week.iter().sum::<f64>(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_buckets_follow_offset() {
        // 23:00 UTC on a Saturday is 01:00 Sunday at UTC+2
        let ts = Utc.with_ymd_and_hms(2024, 1, 6, 23, 0, 0).unwrap();
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();

        assert_eq!(hour_bucket(ts, utc()), 23);
        assert_eq!(weekday_bucket(ts, utc()), 6);
        assert_eq!(hour_bucket(ts, tz), 1);
        assert_eq!(weekday_bucket(ts, tz), 0);
    }
}
