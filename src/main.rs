// ABOUTME: Main entry point wiring config, identity, session store, and HTTP server
// ABOUTME: Initializes logging and metrics, then serves until the process exits

use anyhow::Result;
use burpla::{
    config::Config, identity::IdentityStore, metrics, server::{start_server, AppState},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting burpla");

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Arc::new(Config::load()?);

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        workspace = %config.workspace.path,
        poll_interval_secs = config.presence.poll_interval_secs,
        assistant = %config.assistant.name,
        "Configuration loaded"
    );

    // Establish the local identity (generated on first run, reused after)
    let identity_store = IdentityStore::new(&config.workspace.path);
    let identity = identity_store.identity();
    tracing::info!(user_id = %identity.id, name = %identity.name, "Local identity ready");

    // Session store, classifier, and metrics behind the HTTP surface
    let mut state = AppState::new(Arc::clone(&config))?;
    state.metrics_handle = Some(metrics::init_metrics()?);

    start_server(Arc::new(state)).await
}
