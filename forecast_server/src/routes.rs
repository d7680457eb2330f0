//! API route handlers

use crate::envelope::{ForecastEnvelope, ForecastQuery, ForecastRequest, ModelInfo};
use crate::error::{Result, ServerError};
use crate::AppState;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use crate::source::ReadingSource;
use seasonal_forecast::{
    Backtest, BacktestReport, ForecastModel, SeasonalTrend, TimeSeries, TrainedForecastModel,
};
use std::time::Instant;
use tracing::{error, info, warn};

/// Backtest cutoff used when the request names none
const DEFAULT_BACKTEST_DAYS: i64 = 3;

/// Furthest back a backtest cutoff may lie
const MAX_BACKTEST_DAYS: i64 = 365;

/// Client key when no identifying header is present
const ANONYMOUS_CLIENT: &str = "anonymous";

/// `GET /api/v1/energy-forecast?live=&hours=&backtest=&backtest_days=`
pub async fn forecast_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ForecastQuery>,
) -> Response {
    respond(state, &headers, query.into_request()).await
}

/// `POST /api/v1/energy-forecast` with a JSON body
pub async fn forecast_body(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        Ok(ForecastRequest::default())
    } else {
        serde_json::from_slice::<ForecastRequest>(&body)
            .map_err(|e| ServerError::BadRequest(format!("Malformed request body: {}", e)))
    };

    respond(state, &headers, request).await
}

/// Liveness probe
pub async fn liveness() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn respond(
    state: AppState,
    headers: &HeaderMap,
    request: Result<ForecastRequest>,
) -> Response {
    let client = client_identity(headers);
    if !state.limiter.try_acquire(&client) {
        warn!(client = %client, "rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ForecastEnvelope::failure("Rate limit exceeded", Utc::now())),
        )
            .into_response();
    }

    let outcome = match request {
        // File IO and the fit itself run off the async workers
        Ok(request) => {
            tokio::task::spawn_blocking(move || run_forecast(&state, &request, Utc::now()))
                .await
                .unwrap_or_else(|e| Err(ServerError::Task(e.to_string())))
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(envelope) => (StatusCode::OK, Json(envelope)).into_response(),
        Err(e) => {
            error!(error = %e, "forecast error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ForecastEnvelope::failure(e.to_string(), Utc::now())),
            )
                .into_response()
        }
    }
}

/// Fit on the selected readings and build the response body
pub fn run_forecast(
    state: &AppState,
    request: &ForecastRequest,
    now: DateTime<Utc>,
) -> Result<ForecastEnvelope> {
    let started = Instant::now();
    let config = &state.config;

    let hours = request.forecast_hours.unwrap_or(config.default_forecast_hours);
    if hours < 1 || hours > config.max_forecast_hours {
        return Err(ServerError::BadRequest(format!(
            "forecastHours must be between 1 and {}, got {}",
            config.max_forecast_hours, hours
        )));
    }
    let hours = hours as usize;

    info!(
        hours,
        live = request.use_live_data,
        backtest = request.backtest,
        "generating forecast"
    );

    let (readings, source) = load_readings(state, request.use_live_data, now)?;
    let model = SeasonalTrend::with_config(config.forecast);

    let backtest = if request.backtest {
        let days = request.backtest_days.unwrap_or(DEFAULT_BACKTEST_DAYS);
        match run_backtest(source, &model, now, days, hours) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(error = %e, "backtesting failed");
                None
            }
        }
    } else {
        None
    };

    let trained = model.train(&readings)?;
    let forecast = trained.forecast(hours)?;

    let algorithm = if source.is_live() {
        format!("{} (using real energy data)", SeasonalTrend::ALGORITHM)
    } else {
        format!("{} (synthetic demo data)", SeasonalTrend::ALGORITHM)
    };

    let model_info = ModelInfo {
        training_samples: trained.training_samples(),
        forecast_horizon_hours: hours,
        generated_at: Utc::now(),
        training_duration_ms: started.elapsed().as_secs_f64() * 1000.0,
        algorithm,
    };

    Ok(ForecastEnvelope::success(
        readings.tail(config.history_hours),
        forecast.points(),
        backtest.as_ref(),
        model_info,
    ))
}

/// Replay the model from `days` ago on a series reaching back past the cutoff
fn run_backtest(
    source: &dyn ReadingSource,
    model: &SeasonalTrend,
    now: DateTime<Utc>,
    days: i64,
    hours: usize,
) -> Result<BacktestReport> {
    let backtest = Backtest::days_ago(now, days, hours)?.with_model(model.clone());
    if days > MAX_BACKTEST_DAYS {
        return Err(ServerError::BadRequest(format!(
            "backtestDays must be at most {}, got {}",
            MAX_BACKTEST_DAYS, days
        )));
    }

    let readings = source.load_since(backtest.training_start()?, now)?;
    Ok(backtest.run(&readings)?)
}

/// Live readings when asked for and available, synthetic data otherwise
fn load_readings(
    state: &AppState,
    use_live: bool,
    now: DateTime<Utc>,
) -> Result<(TimeSeries, &dyn ReadingSource)> {
    if use_live {
        match &state.live {
            Some(source) => match source.load(now) {
                Ok(readings) if !readings.is_empty() => {
                    info!(records = readings.len(), "using live energy readings");
                    return Ok((readings, source.as_ref()));
                }
                Ok(_) => info!("no recent energy readings, falling back to synthetic data"),
                Err(e) => {
                    warn!(error = %e, "error loading live data, falling back to synthetic data")
                }
            },
            None => warn!("live data requested but no live source is configured"),
        }
    }

    let readings = state.synthetic.load(now)?;
    Ok((readings, state.synthetic.as_ref()))
}

fn client_identity(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header("x-client-info")
        .or_else(|| header("x-forwarded-for").and_then(|v| v.split(',').next()).map(str::trim))
        .unwrap_or(ANONYMOUS_CLIENT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_identity() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_identity(&headers), "anonymous");

        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.7, 172.16.0.1"));
        assert_eq!(client_identity(&headers), "10.0.0.7");

        headers.insert("x-client-info", HeaderValue::from_static("dashboard/1.2"));
        assert_eq!(client_identity(&headers), "dashboard/1.2");
    }
}
