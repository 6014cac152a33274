//! Kapost connector webhook service.
//!
//! Main entry point: initializes tracing, loads configuration, and
//! serves the webhook endpoint until shutdown.

use std::sync::Arc;

use anyhow::Result;
use kapost_bridge::Config;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting Kapost connector webhook service");

    let config = Config::load()?;
    let addr = config.parse_server_addr()?;
    info!(
        host = %config.host,
        port = config.port,
        request_timeout_secs = config.request_timeout,
        "Configuration loaded"
    );

    // Secrets are fixed for the lifetime of the process; every request
    // task reads the same immutable value.
    let credentials = Arc::new(config.credentials());

    kapost_bridge::start_server(credentials, addr, config.request_timeout()).await?;

    info!("Kapost connector shutdown complete");
    Ok(())
}

/// Initializes tracing with environment-based configuration.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,kapost_bridge=debug,tower_http=debug"))
        .expect("Invalid RUST_LOG environment variable");

    let fmt_layer = fmt::layer().with_target(true).with_file(true).with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}
