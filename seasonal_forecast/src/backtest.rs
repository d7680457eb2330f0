//! Replaying the forecaster from a point in the past

use crate::data::{TimePoint, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::metrics::{accuracy_against_actuals, AccuracyMetrics};
use crate::models::seasonal_trend::SeasonalTrend;
use crate::models::{ForecastModel, ForecastPoint, TrainedForecastModel};
use crate::utils::truncate_to_hour;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

/// Outcome of one backtest run
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    /// Cutoff the model was trained up to
    pub backtest_date: DateTime<Utc>,
    /// Forecast made at the cutoff
    pub forecast_points: Vec<ForecastPoint>,
    /// Readings observed during the forecast window
    pub actual_points: Vec<TimePoint>,
    /// Comparison of the two
    pub accuracy_metrics: AccuracyMetrics,
}

/// Train on readings before a cutoff and score the forecast against what followed
#[derive(Debug, Clone)]
pub struct Backtest {
    cutoff: DateTime<Utc>,
    horizon: usize,
    training_window: Duration,
    model: SeasonalTrend,
}

impl Backtest {
    /// Create a backtest at an explicit cutoff
    pub fn new(cutoff: DateTime<Utc>, horizon: usize) -> Self {
        Self {
            cutoff,
            horizon,
            training_window: Duration::days(30),
            model: SeasonalTrend::new(),
        }
    }

    /// Cutoff `days` before `now`, on the hour
    pub fn days_ago(now: DateTime<Utc>, days: i64, horizon: usize) -> Result<Self> {
        if days < 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "Backtest offset must not be negative, got {} days",
                days
            )));
        }

        let cutoff = Duration::try_days(days)
            .and_then(|offset| now.checked_sub_signed(offset))
            .ok_or_else(|| {
                ForecastError::InvalidParameter(format!(
                    "Backtest offset of {} days is out of range",
                    days
                ))
            })?;

        Ok(Self::new(truncate_to_hour(cutoff)?, horizon))
    }

    /// Use a specific model configuration
    pub fn with_model(mut self, model: SeasonalTrend) -> Self {
        self.model = model;
        self
    }

    /// Get the cutoff
    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    /// Earliest reading the backtest trains on
    pub fn training_start(&self) -> Result<DateTime<Utc>> {
        self.cutoff
            .checked_sub_signed(self.training_window)
            .ok_or_else(|| {
                ForecastError::InvalidParameter(format!(
                    "Backtest cutoff {} leaves no room for a training window",
                    self.cutoff
                ))
            })
    }

    /// Run against a series covering both sides of the cutoff
    pub fn run(&self, readings: &TimeSeries) -> Result<BacktestReport> {
        let training = readings.between(self.training_start()?, self.cutoff);
        let trained = self.model.train(&training)?;
        let forecast = trained.forecast(self.horizon)?.into_points();

        let window_end = self.cutoff + Duration::hours(self.horizon as i64);
        let actual_points: Vec<TimePoint> = readings
            .points()
            .iter()
            .filter(|p| p.timestamp >= self.cutoff && p.timestamp <= window_end)
            .copied()
            .collect();

        if actual_points.is_empty() {
            return Err(ForecastError::DataError(format!(
                "No readings between {} and {}",
                self.cutoff, window_end
            )));
        }

        let accuracy_metrics = accuracy_against_actuals(&forecast, &actual_points);
        info!(
            cutoff = %self.cutoff,
            mape = accuracy_metrics.mape,
            accuracy = accuracy_metrics.accuracy_score,
            "backtest completed"
        );

        Ok(BacktestReport {
            backtest_date: self.cutoff,
            forecast_points: forecast,
            actual_points,
            accuracy_metrics,
        })
    }
}
