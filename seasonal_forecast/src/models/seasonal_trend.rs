//! Linear trend plus daily and weekly seasonality

use crate::config::ForecastConfig;
use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::seasonality::SeasonalProfile;
use crate::models::trend::Trend;
use crate::models::{ForecastModel, ForecastPoint, ForecastResult, TrainedForecastModel};
use crate::utils::future_hourly_timestamps;
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use tracing::debug;

/// Seasonal-trend model specification
#[derive(Debug, Clone)]
pub struct SeasonalTrend {
    /// Name of the model
    name: String,
    /// Fitting and projection settings
    config: ForecastConfig,
}

/// Seasonal-trend model fitted to a reading series
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedSeasonalTrend {
    /// Name of the model
    name: String,
    /// Fitting and projection settings
    config: ForecastConfig,
    /// Long-run linear component
    trend: Trend,
    /// Hour-of-day and weekday offsets
    seasonality: SeasonalProfile,
    /// Root mean square of the in-sample residuals
    residual_std_dev: f64,
    /// Number of readings fitted
    training_samples: usize,
    /// Timestamp of the latest fitted reading
    last_timestamp: DateTime<Utc>,
}

impl SeasonalTrend {
    /// Algorithm label reported to clients
    pub const ALGORITHM: &'static str = "Simple Trend + Seasonality";

    /// Create a model with default settings
    pub fn new() -> Self {
        Self::with_config(ForecastConfig::default())
    }

    /// Create a model with explicit settings
    pub fn with_config(config: ForecastConfig) -> Self {
        Self {
            name: Self::ALGORITHM.to_string(),
            config,
        }
    }

    /// Get the settings
    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }
}

impl Default for SeasonalTrend {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastModel for SeasonalTrend {
    type Trained = TrainedSeasonalTrend;

    fn train(&self, data: &TimeSeries) -> Result<Self::Trained> {
        let series = if self.config.regularize_hourly {
            Cow::Owned(data.regularize_hourly())
        } else {
            Cow::Borrowed(data)
        };

        if series.len() < 2 {
            return Err(ForecastError::InsufficientData(format!(
                "Need at least 2 readings to fit, got {}",
                series.len()
            )));
        }

        if let Some(bad) = series.points().iter().find(|p| !p.value.is_finite()) {
            return Err(ForecastError::DataError(format!(
                "Non-finite reading at {}",
                bad.timestamp
            )));
        }

        let tz = self.config.utc_offset;
        let trend = Trend::fit(&series.values())?;
        let seasonality = SeasonalProfile::fit(series.points(), tz);

        let n = series.len();
        let sum_squares: f64 = series
            .points()
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let residual = p.value - (trend.at(i) + seasonality.offset_at(p.timestamp, tz));
                residual * residual
            })
            .sum();
        let residual_std_dev = (sum_squares / n as f64).sqrt();

        let last_timestamp = series.last_timestamp().ok_or_else(|| {
            ForecastError::InsufficientData("Series has no readings".to_string())
        })?;

        debug!(
            samples = n,
            slope = trend.slope,
            intercept = trend.intercept,
            residual_std_dev,
            "fitted seasonal-trend model"
        );

        Ok(TrainedSeasonalTrend {
            name: self.name.clone(),
            config: self.config,
            trend,
            seasonality,
            residual_std_dev,
            training_samples: n,
            last_timestamp,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedSeasonalTrend {
    /// Fitted linear component
    pub fn trend(&self) -> &Trend {
        &self.trend
    }

    /// Fitted seasonal offsets
    pub fn seasonality(&self) -> &SeasonalProfile {
        &self.seasonality
    }

    /// Residual deviation the confidence margin is built from
    pub fn residual_std_dev(&self) -> f64 {
        self.residual_std_dev
    }

    /// Number of readings the model was fitted on
    pub fn training_samples(&self) -> usize {
        self.training_samples
    }

    /// Timestamp of the latest fitted reading
    pub fn last_timestamp(&self) -> DateTime<Utc> {
        self.last_timestamp
    }

    /// Settings the model was fitted with
    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }
}

impl TrainedForecastModel for TrainedSeasonalTrend {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Forecast horizon must be at least 1 hour".to_string(),
            ));
        }

        let tz = self.config.utc_offset;
        let base_margin = self.config.confidence_multiplier * self.residual_std_dev;

        let points = future_hourly_timestamps(self.last_timestamp, horizon)
            .into_iter()
            .enumerate()
            .map(|(step, timestamp)| {
                let index = self.training_samples + step;
                let raw = self.trend.at(index) + self.seasonality.offset_at(timestamp, tz);
                let predicted = raw.max(0.0);
                let margin = base_margin * self.config.interval_growth.factor(step + 1);

                ForecastPoint {
                    timestamp,
                    predicted,
                    lower: (predicted - margin).max(0.0),
                    upper: predicted + margin,
                }
            })
            .collect();

        debug!(horizon, "projected seasonal-trend forecast");

        Ok(ForecastResult::new(points))
    }

    fn predict(&self, data: &TimeSeries) -> Result<Vec<f64>> {
        if data.is_empty() {
            return Err(ForecastError::DataError(
                "Empty time series data".to_string(),
            ));
        }

        let tz = self.config.utc_offset;
        Ok(data
            .points()
            .iter()
            .enumerate()
            .map(|(i, p)| self.trend.at(i) + self.seasonality.offset_at(p.timestamp, tz))
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Fit a default seasonal-trend model
pub fn fit(series: &TimeSeries) -> Result<TrainedSeasonalTrend> {
    SeasonalTrend::new().train(series)
}

/// Project `horizon_hours` hourly points past the end of the fitted series
pub fn predict(model: &TrainedSeasonalTrend, horizon_hours: usize) -> Result<Vec<ForecastPoint>> {
    Ok(model.forecast(horizon_hours)?.into_points())
}
