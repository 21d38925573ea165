use sealdrop::{
    config::AppConfig,
    ingest::{ingest_router, IngestState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging first
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sealdrop=debug,sealdrop_ingest=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting sealdrop ingest v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    info!("Configuration loaded");

    if config.ingest.auth_secret.as_deref().map_or(true, str::is_empty) {
        warn!("No ingest auth secret configured; every upload will be rejected");
        warn!("Set ingest.auth_secret in config/default.toml or SEALDROP_INGEST__AUTH_SECRET");
    }

    let state = Arc::new(
        IngestState::new(
            config.ingest.auth_secret.clone(),
            config.ingest.storage_dir.clone(),
        )
        .with_max_body_bytes(config.ingest.max_body_bytes),
    );

    let addr = config.ingest.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(
        "Ingest receiver listening on http://{}, storing uploads in {}",
        addr,
        config.ingest.storage_dir.display()
    );

    axum::serve(listener, ingest_router(state)).await?;

    Ok(())
}
