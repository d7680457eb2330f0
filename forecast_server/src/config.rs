//! Server configuration from environment variables

use crate::error::{Result, ServerError};
use seasonal_forecast::{ForecastConfig, IntervalGrowth};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Runtime settings for the forecast service
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// CSV export of live readings, if any
    pub live_data_csv: Option<PathBuf>,
    /// Horizon used when the request names none
    pub default_forecast_hours: i64,
    /// Largest horizon a request may ask for
    pub max_forecast_hours: i64,
    /// Number of recent readings echoed back as history
    pub history_hours: usize,
    /// Requests per client per minute, 0 for no limit
    pub rate_limit_per_minute: u32,
    /// Fixed seed for the synthetic generator
    pub synthetic_seed: Option<u64>,
    /// Forecaster settings
    pub forecast: ForecastConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            live_data_csv: None,
            default_forecast_hours: 48,
            max_forecast_hours: 720,
            history_hours: 72,
            rate_limit_per_minute: 60,
            synthetic_seed: None,
            forecast: ForecastConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut forecast = ForecastConfig::default()
            .with_utc_offset_hours(parse_or(&get, "FORECAST_UTC_OFFSET_HOURS", 0)?)
            .map_err(|e| ServerError::Config(e.to_string()))?
            .with_hourly_regularization(parse_flag(&get, "FORECAST_REGULARIZE_HOURLY")?);

        if parse_flag(&get, "FORECAST_WIDEN_WITH_LEAD_TIME")? {
            forecast = forecast.with_interval_growth(IntervalGrowth::SqrtLeadTime);
        }

        if let Some(level) = parse_opt::<f64, _>(&get, "FORECAST_CONFIDENCE_LEVEL")? {
            forecast = forecast
                .with_confidence_level(level)
                .map_err(|e| ServerError::Config(e.to_string()))?;
        }

        let config = Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or(&get, "PORT", defaults.port)?,
            live_data_csv: get("LIVE_DATA_CSV").map(PathBuf::from),
            default_forecast_hours: parse_or(
                &get,
                "FORECAST_DEFAULT_HOURS",
                defaults.default_forecast_hours,
            )?,
            max_forecast_hours: parse_or(&get, "FORECAST_MAX_HOURS", defaults.max_forecast_hours)?,
            history_hours: parse_or(&get, "FORECAST_HISTORY_HOURS", defaults.history_hours)?,
            rate_limit_per_minute: parse_or(
                &get,
                "RATE_LIMIT_PER_MINUTE",
                defaults.rate_limit_per_minute,
            )?,
            synthetic_seed: parse_opt(&get, "SYNTHETIC_SEED")?,
            forecast,
        };

        if config.max_forecast_hours < 1 {
            return Err(ServerError::Config(
                "FORECAST_MAX_HOURS must be at least 1".to_string(),
            ));
        }
        if config.default_forecast_hours < 1
            || config.default_forecast_hours > config.max_forecast_hours
        {
            return Err(ServerError::Config(format!(
                "FORECAST_DEFAULT_HOURS must be between 1 and {}",
                config.max_forecast_hours
            )));
        }

        Ok(config)
    }

    /// Address to bind the listener to
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ServerError::Config(format!("Invalid HOST:PORT configuration: {}", e)))
    }
}

fn parse_opt<T, G>(get: &G, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| {
                ServerError::Config(format!("{} must be a valid value ({}): {}", key, raw, e))
            })
        })
        .transpose()
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(get, key)?.unwrap_or(default))
}

fn parse_flag<G>(get: &G, key: &str) -> Result<bool>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|v| v.to_lowercase()).as_deref() {
        None | Some("false") | Some("0") | Some("no") => Ok(false),
        Some("true") | Some("1") | Some("yes") => Ok(true),
        Some(other) => Err(ServerError::Config(format!(
            "{} must be true or false, got {}",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_forecast_hours, 48);
        assert_eq!(config.history_hours, 72);
        assert_eq!(config.forecast, ForecastConfig::default());
        assert!(config.live_data_csv.is_none());
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("LIVE_DATA_CSV", "/var/lib/readings.csv"),
            ("FORECAST_WIDEN_WITH_LEAD_TIME", "true"),
            ("FORECAST_UTC_OFFSET_HOURS", "1"),
            ("SYNTHETIC_SEED", "7"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.live_data_csv, Some(PathBuf::from("/var/lib/readings.csv")));
        assert_eq!(config.forecast.interval_growth, IntervalGrowth::SqrtLeadTime);
        assert_eq!(config.forecast.utc_offset.local_minus_utc(), 3600);
        assert_eq!(config.synthetic_seed, Some(7));
    }

    #[test]
    fn test_invalid_values() {
        assert!(ServerConfig::from_lookup(lookup(&[("PORT", "eighty")])).is_err());
        let flag = lookup(&[("FORECAST_REGULARIZE_HOURLY", "maybe")]);
        assert!(ServerConfig::from_lookup(flag).is_err());
        assert!(ServerConfig::from_lookup(lookup(&[("FORECAST_DEFAULT_HOURS", "0")])).is_err());
        let level = lookup(&[("FORECAST_CONFIDENCE_LEVEL", "1.5")]);
        assert!(ServerConfig::from_lookup(level).is_err());
    }
}
