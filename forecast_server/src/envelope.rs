//! Request and response payloads

use crate::error::{Result, ServerError};
use chrono::{DateTime, Utc};
use seasonal_forecast::utils::round_to;
use seasonal_forecast::{AccuracyMetrics, BacktestReport, ForecastPoint, TimePoint};
use serde::{Deserialize, Serialize};

/// Decimal places kept in reported values
const REPORTED_DECIMALS: u32 = 2;

/// Forecast request body
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForecastRequest {
    /// Prefer live readings over synthetic data
    pub use_live_data: bool,
    /// Hours to forecast; the configured default when absent
    pub forecast_hours: Option<i64>,
    /// Also replay the forecaster from an earlier cutoff
    pub backtest: bool,
    /// How many days back the backtest cutoff lies
    pub backtest_days: Option<i64>,
}

/// Query string form of [`ForecastRequest`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastQuery {
    pub live: Option<String>,
    pub hours: Option<String>,
    pub backtest: Option<String>,
    pub backtest_days: Option<String>,
}

impl ForecastQuery {
    /// Interpret the query parameters
    pub fn into_request(self) -> Result<ForecastRequest> {
        Ok(ForecastRequest {
            use_live_data: self.live.as_deref() == Some("true"),
            forecast_hours: parse_int("hours", self.hours)?,
            backtest: self.backtest.as_deref() == Some("true"),
            backtest_days: parse_int("backtest_days", self.backtest_days)?,
        })
    }
}

fn parse_int(name: &str, raw: Option<String>) -> Result<Option<i64>> {
    raw.map(|v| {
        v.trim()
            .parse::<i64>()
            .map_err(|_| {
                ServerError::BadRequest(format!("{} must be an integer, got '{}'", name, v))
            })
    })
    .transpose()
}

/// One reading echoed back for charting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub timestamp: DateTime<Utc>,
    pub actual: f64,
}

impl From<&TimePoint> for HistoricalPoint {
    fn from(point: &TimePoint) -> Self {
        Self {
            timestamp: point.timestamp,
            actual: round_to(point.value, REPORTED_DECIMALS),
        }
    }
}

fn rounded(point: &ForecastPoint) -> ForecastPoint {
    ForecastPoint {
        timestamp: point.timestamp,
        predicted: round_to(point.predicted, REPORTED_DECIMALS),
        lower: round_to(point.lower, REPORTED_DECIMALS).max(0.0),
        upper: round_to(point.upper, REPORTED_DECIMALS),
    }
}

/// Description of the fitted model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub training_samples: usize,
    pub forecast_horizon_hours: usize,
    pub generated_at: DateTime<Utc>,
    pub training_duration_ms: f64,
    pub algorithm: String,
}

/// Backtest section of the response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub backtest_date: DateTime<Utc>,
    pub forecast_points: Vec<ForecastPoint>,
    pub actual_points: Vec<HistoricalPoint>,
    pub accuracy_metrics: AccuracyMetrics,
}

impl From<&BacktestReport> for BacktestSummary {
    fn from(report: &BacktestReport) -> Self {
        Self {
            backtest_date: report.backtest_date,
            forecast_points: report.forecast_points.iter().map(rounded).collect(),
            actual_points: report.actual_points.iter().map(HistoricalPoint::from).collect(),
            accuracy_metrics: report.accuracy_metrics,
        }
    }
}

/// Response body for both outcomes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEnvelope {
    pub success: bool,
    pub historical: Vec<HistoricalPoint>,
    pub forecast: Vec<ForecastPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backtest: Option<BacktestSummary>,
    pub model_info: ModelInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ForecastEnvelope {
    /// Successful forecast; values are rounded for reporting
    pub fn success(
        historical: &[TimePoint],
        forecast: &[ForecastPoint],
        backtest: Option<&BacktestReport>,
        model_info: ModelInfo,
    ) -> Self {
        Self {
            success: true,
            historical: historical.iter().map(HistoricalPoint::from).collect(),
            forecast: forecast.iter().map(rounded).collect(),
            backtest: backtest.map(BacktestSummary::from),
            model_info,
            error: None,
        }
    }

    /// Failed request
    pub fn failure(message: impl Into<String>, generated_at: DateTime<Utc>) -> Self {
        Self {
            success: false,
            historical: Vec::new(),
            forecast: Vec::new(),
            backtest: None,
            model_info: ModelInfo {
                training_samples: 0,
                forecast_horizon_hours: 0,
                generated_at,
                training_duration_ms: 0.0,
                algorithm: "error".to_string(),
            },
            error: Some(message.into()),
        }
    }
}
