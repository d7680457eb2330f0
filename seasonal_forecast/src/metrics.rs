//! Accuracy of a forecast against readings observed afterwards

use crate::data::TimePoint;
use crate::models::ForecastPoint;
use crate::utils::round_to;
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Forecast accuracy metrics, rounded to 2 decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    /// Mean Absolute Percentage Error
    pub mape: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// `100 - mape`, floored at zero
    pub accuracy_score: f64,
}

impl AccuracyMetrics {
    /// Metrics reported when nothing could be compared
    pub const NO_MATCHES: AccuracyMetrics = AccuracyMetrics {
        mape: 100.0,
        rmse: 0.0,
        mae: 0.0,
        accuracy_score: 0.0,
    };
}

impl std::fmt::Display for AccuracyMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MAE:      {:.2}", self.mae)?;
        writeln!(f, "  RMSE:     {:.2}", self.rmse)?;
        writeln!(f, "  MAPE:     {:.2}%", self.mape)?;
        writeln!(f, "  Accuracy: {:.2}%", self.accuracy_score)?;
        Ok(())
    }
}

/// Score forecast points against actual readings.
///
/// Each forecast point is paired with the first reading less than one hour
/// away from it. Pairs whose actual value is not positive are skipped since
/// they have no percentage error.
pub fn accuracy_against_actuals(
    forecast: &[ForecastPoint],
    actual: &[TimePoint],
) -> AccuracyMetrics {
    let tolerance_ms = Duration::hours(1).num_milliseconds();

    let mut total_abs = 0.0;
    let mut total_sq = 0.0;
    let mut total_pct = 0.0;
    let mut compared = 0usize;

    for point in forecast {
        let matching = actual
            .iter()
            .find(|a| (point.timestamp - a.timestamp).num_milliseconds().abs() < tolerance_ms);

        if let Some(a) = matching.filter(|a| a.value > 0.0) {
            let error = (point.predicted - a.value).abs();
            total_abs += error;
            total_sq += error * error;
            total_pct += error / a.value * 100.0;
            compared += 1;
        }
    }

    if compared == 0 {
        return AccuracyMetrics::NO_MATCHES;
    }

    let n = compared as f64;
    let mape = total_pct / n;

    AccuracyMetrics {
        mape: round_to(mape, 2),
        rmse: round_to((total_sq / n).sqrt(), 2),
        mae: round_to(total_abs / n, 2),
        accuracy_score: round_to((100.0 - mape).max(0.0), 2),
    }
}
