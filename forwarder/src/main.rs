use anyhow::{Context, Result};
use forwarder::api::{create_router, ApiState};
use forwarder::registry::build_destinations;
use relay::config::RelayConfig;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forwarder=info,relay=info".into()),
        )
        .init();

    info!("Relay forwarder starting...");

    let config = RelayConfig::from_env().context("Failed to load relay configuration")?;
    info!(
        host = %config.api.host,
        port = config.api.port,
        max_session_retries = config.forwarding.max_session_retries,
        "Configuration loaded"
    );

    let destinations = build_destinations(&config)?;
    info!(destinations = destinations.len(), "Destinations initialized");

    let router = create_router(ApiState::new(destinations));
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.api.host, config.api.port))
        .await
        .context("Failed to bind ingestion API port")?;
    info!(host = %config.api.host, port = config.api.port, "Ingestion API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Ingestion API server error")?;

    info!("Relay forwarder stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for ctrl_c signal");
    }
    info!("Shutdown signal received");
}
