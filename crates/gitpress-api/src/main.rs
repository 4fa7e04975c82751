//! gitpress receiver server.

use anyhow::Context;
use gitpress_api::{AppState, routes};
use gitpress_config::ServerConfig;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env().context("loading configuration")?;
    info!(
        owner = %config.repo_owner,
        clone_root = %config.clone_root.display(),
        site_root = %config.site_root.display(),
        "configuration loaded"
    );

    let addr = config.bind_addr;
    let state = AppState::new(config);

    let app = routes::router(state).layer(TraceLayer::new_for_http());

    info!("starting server on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
