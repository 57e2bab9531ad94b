//! Overlook relay - fans camera state out between connected viewers

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use overlook_net::{RelayConfig, RelayServer};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = RelayConfig::from_env();
    let server = RelayServer::bind(&config)
        .await
        .with_context(|| format!("Failed to bind relay on {}", config.addr()))?;
    info!(addr = %server.local_addr()?, "Relay listening");

    tokio::select! {
        result = server.run() => result.context("Relay stopped")?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down relay"),
    }

    Ok(())
}
