//! msgpet: a line-oriented TCP echo server.
//!
//! Accepts TCP connections, reads a single newline-terminated line
//! from each, echoes it back, and closes the connection. Every
//! connection is served by its own task and nothing is shared between
//! them.
//!
//! Features:
//! - One-shot echo exchange per connection
//! - Unbounded task-per-connection concurrency
//! - Configuration via CLI arguments or TOML file
//!
//! The companion `msgpet-bench` binary drives the server under load.

mod config;
mod protocol;
mod server;

use config::Config;
use server::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging; diagnostics go to stderr, never the client
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!(address = %config.listen, "Starting msgpet echo server");

    // Bind and accept failures are both fatal; there is no supervisor
    // to restart the listener and no graceful shutdown path. The
    // process runs until killed.
    let server = Server::bind(&config).await?;
    server.run().await?;

    Ok(())
}
