//! shelter server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shelter_client::{FetchClient, FetchConfig, Network};
use shelter_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod state;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(db = %config.db_path.display(), origin = %config.origin, "starting shelter server on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let network: Arc<dyn Network> = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let state = Arc::new(state::AppState::new(config, db, network));

    match state.bootstrap().await {
        Ok(outcome) => tracing::info!(?outcome, "worker deployed"),
        Err(e) => tracing::warn!("initial install failed, serving without a worker: {e}"),
    }

    let handler = handler::ShelterServer::new(state);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
