use alertwatch::api::{create_app, LiveAppState, QueryAppState};
use alertwatch::broadcast::Broadcaster;
use alertwatch::config::resolve_config;
use alertwatch::extractor::JsonExtractor;
use alertwatch::poller::Poller;
use alertwatch::state::SnapshotStore;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alertwatch=info".into()),
        )
        .init();

    info!("Alertwatch starting...");

    let config_path = std::env::var("ALERTWATCH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("alertwatch.toml"));
    let config = resolve_config(&config_path)?;

    info!(
        config = %config_path.display(),
        source = %config.source.url,
        interval_secs = config.poller.interval_seconds,
        port = config.server.port,
        "Configuration loaded"
    );

    let store = Arc::new(SnapshotStore::new());
    let broadcaster = Arc::new(Broadcaster::new());

    let extractor = Arc::new(
        JsonExtractor::new(config.source.clone()).context("Failed to initialize extractor")?,
    );
    let poller = Poller::new(
        extractor,
        Arc::clone(&store),
        Arc::clone(&broadcaster),
        &config.poller,
        config.source.timeout(),
    );
    let poll_status = poller.status();
    let poll_handle = poller.start();

    let app = create_app(
        Arc::new(LiveAppState {
            store: Arc::clone(&store),
            broadcaster: Arc::clone(&broadcaster),
            keep_alive: Duration::from_secs(config.server.keep_alive_seconds),
        }),
        Arc::new(QueryAppState {
            store,
            broadcaster,
            poll_status,
        }),
        config.server.static_dir.as_deref(),
    );

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.server.port))
        .await
        .context("Failed to bind HTTP port")?;
    info!(port = config.server.port, "HTTP API listening");

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "HTTP server error");
        }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c signal")?;
    info!("Shutdown signal received");

    server_handle.abort();
    poll_handle.abort();
    info!("Alertwatch stopped");

    Ok(())
}
