use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use forecast_server::config::ServerConfig;
use forecast_server::envelope::ForecastEnvelope;
use forecast_server::rate_limit::TokenBucketLimiter;
use forecast_server::{app, AppState};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower::ServiceExt;

const SYNTHETIC_LABEL: &str = "Simple Trend + Seasonality (synthetic demo data)";
const LIVE_LABEL: &str = "Simple Trend + Seasonality (using real energy data)";

fn test_config() -> ServerConfig {
    ServerConfig {
        rate_limit_per_minute: 0,
        synthetic_seed: Some(17),
        ..ServerConfig::default()
    }
}

fn test_app(config: ServerConfig) -> Router {
    app(AppState::from_config(config))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, ForecastEnvelope) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/energy-forecast")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// Hourly readings for the last `days` days, flat apart from a daily bump
fn live_export(days: i64) -> NamedTempFile {
    let now = Utc::now();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "recorded_at,current_power").unwrap();
    for i in (0..days * 24).rev() {
        let ts = now - Duration::hours(i);
        let value = if i % 24 < 8 { 30.0 } else { 55.0 };
        writeln!(file, "{},{}", ts.to_rfc3339(), value).unwrap();
    }
    file
}

#[tokio::test]
async fn test_default_forecast() {
    let (status, body) = send(test_app(test_config()), get("/api/v1/energy-forecast")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.success);
    assert_eq!(body.forecast.len(), 48);
    assert_eq!(body.historical.len(), 72);
    assert_eq!(body.model_info.training_samples, 721);
    assert_eq!(body.model_info.forecast_horizon_hours, 48);
    assert_eq!(body.model_info.algorithm, SYNTHETIC_LABEL);
    assert!(body.error.is_none());
    assert!(body.backtest.is_none());

    let last_historical = body.historical.last().unwrap().timestamp;
    assert_eq!(body.forecast[0].timestamp, last_historical + Duration::hours(1));
    for p in &body.forecast {
        assert!(p.lower >= 0.0 && p.lower <= p.predicted && p.predicted <= p.upper);
    }
}

#[tokio::test]
async fn test_post_body_horizon() {
    let (status, body) = send(test_app(test_config()), post(r#"{"forecastHours": 12}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.forecast.len(), 12);
    assert_eq!(body.model_info.forecast_horizon_hours, 12);
}

#[tokio::test]
async fn test_empty_post_uses_defaults() {
    let (status, body) = send(test_app(test_config()), post("")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.forecast.len(), 48);
}

#[tokio::test]
async fn test_malformed_body_is_failure_envelope() {
    let (status, body) = send(test_app(test_config()), post("{not json")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.success);
    assert!(body.historical.is_empty());
    assert!(body.forecast.is_empty());
    assert_eq!(body.model_info.algorithm, "error");
    assert_eq!(body.model_info.training_samples, 0);
    assert!(body.error.unwrap().contains("Malformed request body"));
}

#[tokio::test]
async fn test_horizon_bounds() {
    for uri in [
        "/api/v1/energy-forecast?hours=0",
        "/api/v1/energy-forecast?hours=-5",
        "/api/v1/energy-forecast?hours=10000",
        "/api/v1/energy-forecast?hours=soon",
    ] {
        let (status, body) = send(test_app(test_config()), get(uri)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        assert!(!body.success);
    }
}

#[tokio::test]
async fn test_live_csv_readings() {
    let export = live_export(10);
    let config = ServerConfig {
        live_data_csv: Some(export.path().to_path_buf()),
        ..test_config()
    };

    let uri = "/api/v1/energy-forecast?live=true&hours=24";
    let (status, body) = send(test_app(config), get(uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.model_info.algorithm, LIVE_LABEL);
    assert_eq!(body.model_info.training_samples, 240);
    assert_eq!(body.forecast.len(), 24);
    assert!(body.historical.iter().all(|p| p.actual == 30.0 || p.actual == 55.0));
}

#[tokio::test]
async fn test_missing_live_export_falls_back() {
    let config = ServerConfig {
        live_data_csv: Some(PathBuf::from("/nonexistent/readings.csv")),
        ..test_config()
    };

    let (status, body) = send(test_app(config), post(r#"{"useLiveData": true}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.model_info.algorithm, SYNTHETIC_LABEL);
    assert_eq!(body.model_info.training_samples, 721);
}

#[tokio::test]
async fn test_backtest_section() {
    let (status, body) = send(
        test_app(test_config()),
        get("/api/v1/energy-forecast?hours=24&backtest=true&backtest_days=3"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let backtest = body.backtest.expect("backtest section");
    assert_eq!(backtest.forecast_points.len(), 24);
    assert!(!backtest.actual_points.is_empty());
    assert!(backtest.accuracy_metrics.accuracy_score >= 0.0);
}

#[tokio::test]
async fn test_backtest_reaches_past_forecast_window() {
    let export = live_export(70);
    let config = ServerConfig {
        live_data_csv: Some(export.path().to_path_buf()),
        ..test_config()
    };

    let uri = "/api/v1/energy-forecast?live=true&hours=24&backtest=true&backtest_days=30";
    let (status, body) = send(test_app(config), get(uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.model_info.algorithm, LIVE_LABEL);
    assert!(body.model_info.training_samples <= 30 * 24 + 1);

    let backtest = body.backtest.expect("backtest section");
    let age = Utc::now() - backtest.backtest_date;
    assert!(age >= Duration::days(30) && age < Duration::days(30) + Duration::hours(2));
    assert_eq!(backtest.forecast_points.len(), 24);
    assert!(backtest.actual_points.len() >= 24);
    assert!(backtest.accuracy_metrics.accuracy_score > 0.0);
}

#[tokio::test]
async fn test_backtest_offset_out_of_range_is_omitted() {
    for days in ["100000000", "5000"] {
        let uri = format!(
            "/api/v1/energy-forecast?hours=24&backtest=true&backtest_days={}",
            days
        );
        let (status, body) = send(test_app(test_config()), get(&uri)).await;

        assert_eq!(status, StatusCode::OK, "{}", days);
        assert!(body.success);
        assert_eq!(body.forecast.len(), 24);
        assert!(body.backtest.is_none());
    }
}

#[tokio::test]
async fn test_rate_limited_client() {
    let mut state = AppState::from_config(test_config());
    state.limiter = Arc::new(TokenBucketLimiter::per_minute(1));
    let router = app(state);

    let request = || {
        Request::builder()
            .uri("/api/v1/energy-forecast?hours=1")
            .header("x-client-info", "dashboard")
            .body(Body::empty())
            .unwrap()
    };

    let (first, _) = send(router.clone(), request()).await;
    let (second, body) = send(router.clone(), request()).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body.model_info.algorithm, "error");
    assert_eq!(body.error.as_deref(), Some("Rate limit exceeded"));
}

#[tokio::test]
async fn test_health() {
    let response = test_app(test_config()).oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "alive");
}
