//! Forecaster configuration

use crate::error::{ForecastError, Result};
use chrono::{FixedOffset, Offset, Utc};
use statrs::distribution::{ContinuousCDF, Normal};

/// Multiplier for a 95% interval
pub const DEFAULT_CONFIDENCE_MULTIPLIER: f64 = 1.96;

/// How the confidence margin evolves over the forecast horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntervalGrowth {
    /// Same margin at every lead time
    #[default]
    Constant,
    /// Margin scaled by the square root of the lead time in hours
    SqrtLeadTime,
}

impl IntervalGrowth {
    /// Scale applied to the base margin `lead_hours` steps ahead
    pub fn factor(&self, lead_hours: usize) -> f64 {
        match self {
            IntervalGrowth::Constant => 1.0,
            IntervalGrowth::SqrtLeadTime => (lead_hours as f64).sqrt(),
        }
    }
}

/// Tuning knobs for the seasonal-trend forecaster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastConfig {
    /// Number of residual standard deviations on each side of the prediction
    pub confidence_multiplier: f64,
    /// Margin behaviour across the horizon
    pub interval_growth: IntervalGrowth,
    /// Offset used to assign readings to hour-of-day and weekday buckets
    pub utc_offset: FixedOffset,
    /// Resample onto a strict hourly grid before fitting
    pub regularize_hourly: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            confidence_multiplier: DEFAULT_CONFIDENCE_MULTIPLIER,
            interval_growth: IntervalGrowth::Constant,
            utc_offset: Utc.fix(),
            regularize_hourly: false,
        }
    }
}

impl ForecastConfig {
    /// Derive the multiplier from a two-sided confidence level such as 0.95
    pub fn with_confidence_level(mut self, level: f64) -> Result<Self> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(
                "Confidence level must be between 0 and 1".to_string(),
            ));
        }

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::MathError(format!("Standard normal unavailable: {}", e)))?;
        self.confidence_multiplier = normal.inverse_cdf(0.5 + level / 2.0);
        Ok(self)
    }

    /// Use an explicit multiplier
    pub fn with_confidence_multiplier(mut self, multiplier: f64) -> Result<Self> {
        if !multiplier.is_finite() || multiplier < 0.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "Confidence multiplier must be a non-negative number, got {}",
                multiplier
            )));
        }

        self.confidence_multiplier = multiplier;
        Ok(self)
    }

    /// Set how the margin grows with lead time
    pub fn with_interval_growth(mut self, growth: IntervalGrowth) -> Self {
        self.interval_growth = growth;
        self
    }

    /// Assign seasonal buckets in local time `hours` east of UTC
    pub fn with_utc_offset_hours(mut self, hours: i32) -> Result<Self> {
        self.utc_offset = hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                ForecastError::InvalidParameter(format!("UTC offset out of range: {}h", hours))
            })?;
        Ok(self)
    }

    /// Enable or disable hourly regularisation
    pub fn with_hourly_regularization(mut self, enabled: bool) -> Self {
        self.regularize_hourly = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_matches_fixed_multiplier() {
        let config = ForecastConfig::default();
        assert_eq!(config.confidence_multiplier, 1.96);
        assert_eq!(config.interval_growth, IntervalGrowth::Constant);
        assert_eq!(config.utc_offset.local_minus_utc(), 0);
        assert!(!config.regularize_hourly);
    }

    #[test]
    fn test_confidence_level() {
        let config = ForecastConfig::default().with_confidence_level(0.95).unwrap();
        assert_relative_eq!(config.confidence_multiplier, 1.959_964, epsilon = 1e-5);

        assert!(ForecastConfig::default().with_confidence_level(1.0).is_err());
        assert!(ForecastConfig::default().with_confidence_level(0.0).is_err());
    }

    #[test]
    fn test_utc_offset_bounds() {
        let config = ForecastConfig::default().with_utc_offset_hours(2).unwrap();
        assert_eq!(config.utc_offset.local_minus_utc(), 7200);
        assert!(ForecastConfig::default().with_utc_offset_hours(30).is_err());
    }

    #[test]
    fn test_interval_growth_factor() {
        assert_eq!(IntervalGrowth::Constant.factor(16), 1.0);
        assert_eq!(IntervalGrowth::SqrtLeadTime.factor(16), 4.0);
    }
}
