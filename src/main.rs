mod api;
mod command;
mod config;
mod platform;
mod relay;
mod request;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::platform::twitch;
use crate::relay::Relay;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chatrelay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = dotenvy::dotenv() {
        info!(".env not loaded: {}", e);
    }

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Channel: {}", config.twitch.channel);
    info!("  Endpoint: {}", config.api.endpoint());
    info!("  Schema: {}", config.api.schema);
    info!("  Markers: {:?}", config.command.markers);

    let (incoming, sink) = twitch::connect(&config.twitch)?;
    let relay = Arc::new(Relay::new(&config, Arc::new(sink))?);

    info!("Relay is starting...");
    twitch::run(incoming, relay, &config.twitch.channel).await?;

    Ok(())
}
