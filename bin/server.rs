// Card Registry - Web Server
// REST API with Axum

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use card_registry::config::{init_logging, ServerConfig};
use card_registry::{api, BinlistClient, Registry};

#[derive(Parser)]
#[command(name = "card-server", version, about = "Card registry HTTP server")]
struct Cli {
    #[command(flatten)]
    config: ServerConfig,
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let config = Cli::parse().config;

    info!("💳 Card Registry {} - Web Server", card_registry::VERSION);

    let lookup = BinlistClient::new(&config.lookup_url, config.lookup_timeout())
        .context("Failed to build issuer lookup client")?;

    // Loading and reconciling persisted state must succeed before serving
    let files = config.storage.snapshot_files();
    let registry = Registry::open(files, Arc::new(lookup))
        .with_context(|| format!("Failed to load snapshots from {:?}", config.storage.data_dir))?;

    let app = api::router(Arc::new(registry)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!("🚀 Server running on http://{}", config.bind);
    info!("   API: http://{}/api/v1/cards", config.bind);
    info!("   Issuer lookup: {} (timeout {:?})", config.lookup_url, config.lookup_timeout());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("✅ Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
