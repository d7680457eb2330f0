//! # Seasonal Forecast
//!
//! Short-range forecasting of hourly building energy consumption.
//!
//! ## Features
//!
//! - Hourly reading series with CSV loading
//! - Linear trend plus hour-of-day and day-of-week seasonal offsets
//! - Symmetric confidence bounds from the in-sample residuals
//! - Synthetic demo load for installations without live readings
//! - Backtesting against readings observed after a cutoff
//!
//! ## Model
//!
//! The forecast at lead time `k` is
//!
//! ```text
//! max(0, slope * (n + k - 1) + intercept + hour_of_day[h] + day_of_week[d])
//! ```
//!
//! with bounds `± 1.96 * residual_std_dev`. The trend is fitted against the
//! sample index, so readings are assumed to be one hour apart; enable
//! [`ForecastConfig::regularize_hourly`] when the input has gaps.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use seasonal_forecast::models::seasonal_trend::{fit, predict};
//! use seasonal_forecast::{TimePoint, TimeSeries};
//!
//! let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let readings: Vec<TimePoint> = (0..168)
//!     .map(|i| TimePoint::new(start + Duration::hours(i), 40.0 + (i % 24) as f64))
//!     .collect();
//!
//! let model = fit(&TimeSeries::new(readings)).unwrap();
//! let forecast = predict(&model, 48).unwrap();
//!
//! assert_eq!(forecast.len(), 48);
//! assert_eq!(forecast[0].timestamp, start + Duration::hours(168));
//! ```

pub mod backtest;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod synthetic;
pub mod utils;

// Re-export commonly used types
pub use crate::backtest::{Backtest, BacktestReport};
pub use crate::config::{ForecastConfig, IntervalGrowth};
pub use crate::data::{DataLoader, TimePoint, TimeSeries};
pub use crate::error::ForecastError;
pub use crate::metrics::AccuracyMetrics;
pub use crate::models::seasonal_trend::{SeasonalTrend, TrainedSeasonalTrend};
pub use crate::models::{ForecastModel, ForecastPoint, ForecastResult, TrainedForecastModel};
pub use crate::synthetic::SyntheticLoad;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
