//! # Relay Server
//!
//! Realtime presence and signaling relay.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings (port 8900)
//! relay
//!
//! # Run with a config file in the working directory
//! cat relay.toml && relay
//!
//! # Run with environment variables
//! PORT=8080 RELAY_ALLOWED_ORIGINS=https://chat.example.com relay
//! ```

mod config;
mod handlers;
mod metrics;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tenvis_relay_server=debug,tenvis_relay_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::load()?;

    tracing::info!(
        origins = ?config.cors.allowed_origins,
        "Starting relay server on {}:{}",
        config.host,
        config.port
    );

    // Initialize metrics
    metrics::init_metrics();

    // Start the server
    handlers::run_server(config).await?;

    Ok(())
}
