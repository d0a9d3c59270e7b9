//! # kyc-api: Binary Entry Point
//!
//! Starts the Axum HTTP server. Binds to `PORT` (default 8080).

use kyc_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Configuration invalid: {e}");
        e
    })?;
    tracing::info!(
        network = %config.chain.network,
        latency_ms = config.chain.latency.as_millis() as u64,
        validity_days = config.lifecycle.validity_days,
        "configuration loaded"
    );

    let state = AppState::from_config(&config)?;
    let app = kyc_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("KYC API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
