//! # forecast-server
//!
//! REST API serving the seasonal-trend energy forecast to the dashboard.

use axum::routing::get;
use axum::Router;
use seasonal_forecast::SyntheticLoad;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod envelope;
pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod source;

use crate::config::ServerConfig;
use crate::rate_limit::{RateLimiter, TokenBucketLimiter, Unlimited};
use crate::source::{CsvSource, ReadingSource, SyntheticSource};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Live readings, when an export is configured
    pub live: Option<Arc<dyn ReadingSource>>,
    pub synthetic: Arc<dyn ReadingSource>,
    pub limiter: Arc<dyn RateLimiter>,
}

impl AppState {
    /// Wire sources and the limiter from configuration
    pub fn from_config(config: ServerConfig) -> Self {
        let live = config
            .live_data_csv
            .as_ref()
            .map(|path| Arc::new(CsvSource::new(path)) as Arc<dyn ReadingSource>);

        let synthetic_load = SyntheticLoad {
            utc_offset: config.forecast.utc_offset,
            ..SyntheticLoad::default()
        };
        let synthetic = Arc::new(SyntheticSource::new(synthetic_load, config.synthetic_seed));

        let limiter: Arc<dyn RateLimiter> = match config.rate_limit_per_minute {
            0 => Arc::new(Unlimited),
            n => Arc::new(TokenBucketLimiter::per_minute(n)),
        };

        Self {
            config: Arc::new(config),
            live,
            synthetic,
            limiter,
        }
    }
}

/// Build the router with middleware
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::liveness))
        .route(
            "/api/v1/energy-forecast",
            get(routes::forecast_query).post(routes::forecast_body),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
