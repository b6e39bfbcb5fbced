//! Rent Server - hostel rent prediction service
//!
//! Loads the trained model once and serves predictions over HTTP.

use anyhow::Result;
use rent_server::{api, build_state, config::ServerConfig};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting rent-server");

    let config = ServerConfig::load()?;
    info!(model_path = %config.model_path.display(), "Server configured");

    // Refuse to serve anything if the artifact is unusable
    let state = build_state(&config).await?;

    let addr = config.bind_addr();
    state.logger.log_startup(SERVER_VERSION, &addr);
    let logger = state.logger.clone();

    tokio::select! {
        result = api::serve(&addr, state) => result?,
        _ = tokio::signal::ctrl_c() => {
            logger.log_shutdown("SIGINT received");
            info!("Shutting down");
        }
    }

    Ok(())
}
