//! Ordinary least squares trend against the sample index

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Straight line `slope * index + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    /// Change per sample
    pub slope: f64,
    /// Value at index 0
    pub intercept: f64,
}

impl Trend {
    /// Fit against `x = 0..n-1`.
    ///
    /// The index is positional, so uneven spacing between readings is not
    /// accounted for.
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.len() < 2 {
            return Err(ForecastError::InsufficientData(
                "Need at least 2 points to fit a trend".to_string(),
            ));
        }

        let n = values.len() as f64;
        let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
        for (i, &y) in values.iter().enumerate() {
            let x = i as f64;
            sum_x += x;
            sum_y += y;
            sum_xy += x * y;
            sum_xx += x * x;
        }

        let denominator = n * sum_xx - sum_x * sum_x;
        if denominator.abs() < f64::EPSILON {
            return Err(ForecastError::MathError(
                "Cannot calculate slope: x values are too similar".to_string(),
            ));
        }

        let slope = (n * sum_xy - sum_x * sum_y) / denominator;
        let intercept = (sum_y - slope * sum_x) / n;

        Ok(Self { slope, intercept })
    }

    /// Value of the line at `index`
    pub fn at(&self, index: usize) -> f64 {
        self.slope * index as f64 + self.intercept
    }
}
