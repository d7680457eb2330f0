//! Hourly reading series and CSV loading

use crate::error::{ForecastError, Result};
use crate::utils::parse_timestamp;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One observed reading of a consumption-like quantity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    /// Instant the reading was taken
    pub timestamp: DateTime<Utc>,
    /// Observed value
    pub value: f64,
}

impl TimePoint {
    /// Create a new reading
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Readings ordered ascending by timestamp
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    points: Vec<TimePoint>,
}

impl TimeSeries {
    /// Create a series from readings in any order
    pub fn new(mut points: Vec<TimePoint>) -> Self {
        // Stable, so readings sharing a timestamp keep their input order
        points.sort_by_key(|p| p.timestamp);
        Self { points }
    }

    /// Create a series from parallel timestamp and value vectors
    pub fn from_pairs(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ForecastError::ValidationError(format!(
                "Timestamps length ({}) doesn't match values length ({})",
                timestamps.len(),
                values.len()
            )));
        }

        let points = timestamps
            .into_iter()
            .zip(values)
            .map(|(timestamp, value)| TimePoint::new(timestamp, value))
            .collect();

        Ok(Self::new(points))
    }

    /// Get the readings
    pub fn points(&self) -> &[TimePoint] {
        &self.points
    }

    /// Get the values as a vector
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Get the timestamps as a vector
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    /// Timestamp of the earliest reading
    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points.first().map(|p| p.timestamp)
    }

    /// Timestamp of the latest reading
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points.last().map(|p| p.timestamp)
    }

    /// The most recent `n` readings (all of them when `n` exceeds the length)
    pub fn tail(&self, n: usize) -> &[TimePoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }

    /// Readings with `start <= timestamp < end`
    pub fn between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let points = self
            .points
            .iter()
            .filter(|p| p.timestamp >= start && p.timestamp < end)
            .copied()
            .collect();

        Self { points }
    }

    /// Readings at or after `start`
    pub fn since(&self, start: DateTime<Utc>) -> Self {
        let points = self
            .points
            .iter()
            .filter(|p| p.timestamp >= start)
            .copied()
            .collect();

        Self { points }
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get the number of readings
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Calculate the mean of the values
    pub fn mean(&self) -> Result<f64> {
        if self.points.is_empty() {
            return Err(ForecastError::DataError("No readings available".to_string()));
        }

        let sum: f64 = self.points.iter().map(|p| p.value).sum();
        Ok(sum / self.points.len() as f64)
    }

    /// Calculate the population standard deviation of the values
    pub fn std_dev(&self) -> Result<f64> {
        let mean = self.mean()?;
        let variance = self
            .points
            .iter()
            .map(|p| (p.value - mean).powi(2))
            .sum::<f64>()
            / self.points.len() as f64;

        Ok(variance.sqrt())
    }

    /// Resample onto a strict hourly grid starting at the first reading.
    ///
    /// Grid instants between two readings are linearly interpolated by
    /// elapsed time, so gaps in the input no longer shift the positional
    /// index the trend is fitted against.
    pub fn regularize_hourly(&self) -> Self {
        let (first, last) = match (self.first_timestamp(), self.last_timestamp()) {
            (Some(first), Some(last)) => (first, last),
            _ => return self.clone(),
        };

        let mut grid = Vec::new();
        let mut left = 0;
        let mut t = first;

        while t <= last {
            while left + 1 < self.points.len() && self.points[left + 1].timestamp <= t {
                left += 1;
            }

            let lo = &self.points[left];
            let value = match self.points.get(left + 1) {
                Some(hi) if lo.timestamp < t => {
                    let span = (hi.timestamp - lo.timestamp).num_milliseconds() as f64;
                    let offset = (t - lo.timestamp).num_milliseconds() as f64;
                    lo.value + (hi.value - lo.value) * offset / span
                }
                _ => lo.value,
            };

            grid.push(TimePoint::new(t, value));
            t += Duration::hours(1);
        }

        Self { points: grid }
    }
}

impl From<Vec<TimePoint>> for TimeSeries {
    fn from(points: Vec<TimePoint>) -> Self {
        Self::new(points)
    }
}

/// Data loader for reading exports
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load readings from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<TimeSeries> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load readings from any CSV source with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<TimeSeries> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let time_idx = Self::detect_time_column(&headers)?;
        let value_idx = Self::detect_value_column(&headers, time_idx)?;

        let mut points = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let raw_timestamp = record.get(time_idx).ok_or_else(|| {
                ForecastError::DataError(format!(
                    "Row {} has no time column",
                    points.len() + 1
                ))
            })?;
            let timestamp = parse_timestamp(raw_timestamp)?;

            // Unreadable values count as zero consumption
            let value = record
                .get(value_idx)
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(0.0);

            points.push(TimePoint::new(timestamp, value));
        }

        Ok(TimeSeries::new(points))
    }

    /// Detect the time column in a header row
    fn detect_time_column(headers: &csv::StringRecord) -> Result<usize> {
        headers
            .iter()
            .position(|name| {
                let lower = name.to_lowercase();
                lower.contains("time") || lower.contains("date") || lower.contains("recorded")
            })
            .ok_or_else(|| ForecastError::DataError("No time column found in data".to_string()))
    }

    /// Detect the value column in a header row
    fn detect_value_column(headers: &csv::StringRecord, time_idx: usize) -> Result<usize> {
        let named = headers.iter().enumerate().position(|(idx, name)| {
            let lower = name.to_lowercase();
            idx != time_idx
                && ["value", "power", "consumption", "actual"]
                    .iter()
                    .any(|key| lower.contains(key))
        });

        named
            .or_else(|| (0..headers.len()).find(|&idx| idx != time_idx))
            .ok_or_else(|| ForecastError::DataError("No value column found in data".to_string()))
    }
}
