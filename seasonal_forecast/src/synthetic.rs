//! Synthetic hourly load used when no live readings are available

use crate::data::{TimePoint, TimeSeries};
use crate::models::seasonality::{hour_bucket, weekday_bucket};
use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use rand::Rng;
use std::f64::consts::PI;

/// Demo building load: a daytime hump, a weekday boost, slow drift and noise
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticLoad {
    /// Days of history to generate
    pub days: i64,
    /// Consumption outside working hours
    pub base_load: f64,
    /// Extra load on Monday to Friday
    pub weekday_boost: f64,
    /// Drift added per elapsed day
    pub drift_per_day: f64,
    /// Peak-to-peak width of the uniform noise
    pub noise_amplitude: f64,
    /// Lowest value ever emitted
    pub floor: f64,
    /// Offset used to decide the local hour and weekday
    pub utc_offset: FixedOffset,
}

impl Default for SyntheticLoad {
    fn default() -> Self {
        Self {
            days: 30,
            base_load: 40.0,
            weekday_boost: 10.0,
            drift_per_day: 0.1,
            noise_amplitude: 10.0,
            floor: 5.0,
            utc_offset: Utc.fix(),
        }
    }
}

impl SyntheticLoad {
    /// Generate hourly readings from `end - days` up to and including `end`
    pub fn generate<R: Rng>(&self, end: DateTime<Utc>, rng: &mut R) -> TimeSeries {
        let start = end - Duration::days(self.days);
        let mut points = Vec::with_capacity((self.days.max(0) as usize) * 24 + 1);

        let mut t = start;
        while t <= end {
            let noise = (rng.gen::<f64>() - 0.5) * self.noise_amplitude;
            let value = (self.value_at(start, t) + noise).max(self.floor);
            points.push(TimePoint::new(t, value));
            t += Duration::hours(1);
        }

        TimeSeries::new(points)
    }

    /// Noise-free load at `t` for a series starting at `start`
    pub fn value_at(&self, start: DateTime<Utc>, t: DateTime<Utc>) -> f64 {
        let hour = hour_bucket(t, self.utc_offset);
        let weekday = weekday_bucket(t, self.utc_offset);

        let mut load = self.base_load;
        if (6..=22).contains(&hour) {
            load += 20.0 + 15.0 * ((hour as f64 - 6.0) * PI / 16.0).sin();
        }
        if (1..=5).contains(&weekday) {
            load += self.weekday_boost;
        }

        let days_since_start = (t - start).num_seconds() as f64 / 86_400.0;
        load + days_since_start * self.drift_per_day
    }
}
