//! Where readings come from

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use seasonal_forecast::{DataLoader, ForecastError, SyntheticLoad, TimeSeries};
use std::path::PathBuf;

/// Days of readings a forecast is fitted on
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// A provider of hourly readings
pub trait ReadingSource: Send + Sync {
    /// The last [`RECENT_WINDOW_DAYS`] of readings up to `now`
    fn load(&self, now: DateTime<Utc>) -> Result<TimeSeries, ForecastError>;

    /// Readings from `start` onwards, as of `now`
    fn load_since(
        &self,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<TimeSeries, ForecastError>;

    /// Whether the readings are real measurements
    fn is_live(&self) -> bool;
}

/// Generated demo load
#[derive(Debug, Clone, Default)]
pub struct SyntheticSource {
    load: SyntheticLoad,
    seed: Option<u64>,
}

impl SyntheticSource {
    /// Create a source; a seed makes every call return the same values
    pub fn new(load: SyntheticLoad, seed: Option<u64>) -> Self {
        Self { load, seed }
    }

    fn generate(&self, load: &SyntheticLoad, now: DateTime<Utc>) -> TimeSeries {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        load.generate(now, &mut rng)
    }
}

impl ReadingSource for SyntheticSource {
    fn load(&self, now: DateTime<Utc>) -> Result<TimeSeries, ForecastError> {
        Ok(self.generate(&self.load, now))
    }

    fn load_since(
        &self,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<TimeSeries, ForecastError> {
        // Whole days, rounded up so the series reaches back to `start`
        let days = ((now - start).num_hours() + 23).div_euclid(24).max(1);
        let load = SyntheticLoad { days, ..self.load };
        Ok(self.generate(&load, now))
    }

    fn is_live(&self) -> bool {
        false
    }
}

/// Readings exported to a CSV file
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    /// Serve the export at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReadingSource for CsvSource {
    fn load(&self, now: DateTime<Utc>) -> Result<TimeSeries, ForecastError> {
        self.load_since(now - Duration::days(RECENT_WINDOW_DAYS), now)
    }

    fn load_since(
        &self,
        start: DateTime<Utc>,
        _now: DateTime<Utc>,
    ) -> Result<TimeSeries, ForecastError> {
        let readings = DataLoader::from_csv(&self.path)?;
        Ok(readings.since(start))
    }

    fn is_live(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_synthetic_range_reaches_start() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let source = SyntheticSource::new(SyntheticLoad::default(), Some(3));

        let recent = source.load(now).unwrap();
        assert_eq!(recent.len(), 30 * 24 + 1);

        let start = now - Duration::days(62) - Duration::hours(5);
        let longer = source.load_since(start, now).unwrap();
        assert_eq!(longer.len(), 63 * 24 + 1);
        assert!(longer.first_timestamp().unwrap() <= start);
        assert_eq!(longer.last_timestamp(), Some(now));
    }

    #[test]
    fn test_csv_range() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,value").unwrap();
        for i in (0..24 * 50).rev() {
            let ts = now - Duration::hours(i);
            writeln!(file, "{},{}", ts.to_rfc3339(), 10.0).unwrap();
        }
        let source = CsvSource::new(file.path());

        assert_eq!(source.load(now).unwrap().len(), 30 * 24 + 1);

        let start = now - Duration::days(45);
        let readings = source.load_since(start, now).unwrap();
        assert_eq!(readings.len(), 45 * 24 + 1);
        assert_eq!(readings.first_timestamp(), Some(start));
    }
}
