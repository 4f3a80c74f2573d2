//! Fraudlink hub binary entry point.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fraudlink_core::config::HubConfig;
use fraudlink_hub::Hub;

/// Fraudlink - collective fraud-intelligence hub.
#[derive(Parser, Debug)]
#[command(name = "fraudlink-hub", version, about)]
struct Args {
    /// Override the listen host.
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let env_filter =
        EnvFilter::try_from_env("FRAUDLINK_LOG").unwrap_or_else(|_| EnvFilter::from_default_env());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // Invalid configuration aborts here with a nonzero exit code.
    let mut config = HubConfig::from_env().context("loading configuration")?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    tracing::info!(
        host = %config.host,
        port = config.port,
        entity_threshold = config.entity_threshold,
        time_window_secs = config.time_window_seconds,
        "fraudlink-hub starting"
    );
    tracing::info!(
        medium = config.medium_threshold,
        high = config.high_threshold,
        critical = config.critical_threshold,
        max_graph_age_secs = config.max_graph_age_seconds,
        "escalation thresholds"
    );

    Hub::new(config).run().await
}
