//! Forecasting models for hourly reading series

use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A single projected reading with its confidence bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Instant the projection applies to
    pub timestamp: DateTime<Utc>,
    /// Point forecast
    pub predicted: f64,
    /// Lower confidence bound
    pub lower: f64,
    /// Upper confidence bound
    pub upper: f64,
}

/// Forecast result containing projected points
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    points: Vec<ForecastPoint>,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(points: Vec<ForecastPoint>) -> Self {
        Self { points }
    }

    /// Get the projected points
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Consume the result, keeping the points
    pub fn into_points(self) -> Vec<ForecastPoint> {
        self.points
    }

    /// Get the point forecasts
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.predicted).collect()
    }

    /// Get the (lower, upper) bounds
    pub fn intervals(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.lower, p.upper)).collect()
    }

    /// Get the timestamps
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.points.len()
    }

    /// Calculate mean absolute error between forecast and actual values
    pub fn mean_absolute_error(&self, actual: &[f64]) -> Result<f64> {
        self.check_length(actual)?;

        let sum: f64 = self
            .points
            .iter()
            .zip(actual)
            .map(|(f, a)| (f.predicted - a).abs())
            .sum();

        Ok(sum / self.points.len() as f64)
    }

    /// Calculate mean squared error between forecast and actual values
    pub fn mean_squared_error(&self, actual: &[f64]) -> Result<f64> {
        self.check_length(actual)?;

        let sum: f64 = self
            .points
            .iter()
            .zip(actual)
            .map(|(f, a)| (f.predicted - a).powi(2))
            .sum();

        Ok(sum / self.points.len() as f64)
    }

    fn check_length(&self, actual: &[f64]) -> Result<()> {
        if self.points.is_empty() || self.points.len() != actual.len() {
            return Err(ForecastError::ValidationError(format!(
                "Forecast length ({}) doesn't match actual length ({})",
                self.points.len(),
                actual.len()
            )));
        }
        Ok(())
    }
}

impl IntoIterator for ForecastResult {
    type Item = ForecastPoint;
    type IntoIter = std::vec::IntoIter<ForecastPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Generate forecast for the hours following the training data
    fn forecast(&self, horizon: usize) -> Result<ForecastResult>;

    /// Reconstruct values for the given readings
    fn predict(&self, data: &TimeSeries) -> Result<Vec<f64>>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on a reading series
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on a reading series
    fn train(&self, data: &TimeSeries) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

pub mod seasonal_trend;
pub mod seasonality;
pub mod trend;
