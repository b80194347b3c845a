//! Inventory Registry Service
//!
//! REST API for registering inventory items and their photos

use anyhow::{Context, Result};
use inventory_registry::{create_router, AppState, Config};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inventory_registry=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load configuration")?;

    info!("Starting Inventory Registry Service");
    info!("Cache directory: {}", config.cache_dir.display());
    if let Some(static_dir) = &config.static_dir {
        info!("Static directory: {}", static_dir.display());
    }

    config
        .ensure_directories()
        .context("Failed to create directories")?;

    // Create application state
    let state = AppState::new(config.cache_dir.clone())
        .with_static_dir(config.static_dir.clone())
        .with_max_upload_bytes(config.max_upload_bytes);

    state
        .init()
        .await
        .context("Failed to initialize inventory storage")?;

    // Create router
    let app = create_router(state);

    // Bind and serve
    let addr = config.api_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
