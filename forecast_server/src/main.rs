use anyhow::Context;
use forecast_server::config::ServerConfig;
use forecast_server::{app, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (optional - won't fail if missing)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "forecast_server=info,seasonal_forecast=info,tower_http=info".into()
            }),
        )
        .init();

    let config = ServerConfig::from_env().context("loading configuration")?;
    let addr = config.socket_addr()?;

    if let Some(path) = &config.live_data_csv {
        tracing::info!(path = %path.display(), "live readings enabled");
    }

    let state = AppState::from_config(config);

    tracing::info!("forecast-server v{} listening on {}", env!("CARGO_PKG_VERSION"), addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app(state)).await.context("serving")?;

    Ok(())
}
