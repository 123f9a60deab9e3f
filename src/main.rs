//! Multi-client TCP Broadcast Chat Server - Entry Point
//!
//! Binds the listen port and runs the server until an interrupt signal,
//! draining all connections before exit.

use std::env;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_relay::Server;

/// Default listen port
const DEFAULT_PORT: u16 = 5555;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    // Get listen port from command line or use default
    let port = match env::args().nth(1) {
        Some(arg) => arg
            .parse::<u16>()
            .map_err(|_| format!("invalid port '{arg}'"))?,
        None => DEFAULT_PORT,
    };

    // Bind failure is fatal before any connection is accepted
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Chat server listening on port {}", port);

    let server = Server::new(listener);
    server.run_until_ctrl_c().await?;

    Ok(())
}
