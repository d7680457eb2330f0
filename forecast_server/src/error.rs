//! Error types for the forecast server

use seasonal_forecast::ForecastError;
use thiserror::Error;

/// Errors raised while configuring or serving forecasts
#[derive(Debug, Error)]
pub enum ServerError {
    /// Invalid environment configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request that cannot be served as given
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Failure inside the forecaster
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    /// The blocking forecast task did not complete
    #[error("Forecast task failed: {0}")]
    Task(String),
}

/// Result type with the server error
pub type Result<T> = std::result::Result<T, ServerError>;
