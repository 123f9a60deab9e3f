//! Multi-client TCP Broadcast Chat Server Library
//!
//! A chat server where clients connect over TCP, announce a display name,
//! and exchange length-prefixed messages relayed to every connected client.
//!
//! # Features
//! - Length-prefixed wire framing (4-byte big-endian prefix + payload)
//! - Display name handshake with an anonymous fallback
//! - Broadcast relay that prunes dead peers on delivery failure
//! - Roster reply ("who else is online") on join
//! - Join / departure / shutdown announcements under a system identity
//! - Voluntary disconnect via the `__quit__` sentinel
//! - Coordinated shutdown that drains every connection before exit
//!
//! # Architecture
//! One task per connection plus the accept loop:
//! - `Registry` is the single lock-guarded collection of connected clients;
//!   every mutation and broadcast goes through its methods
//! - Each connection's `ConnectionHandler` owns the read half of its socket
//!   and drives a small state machine; write halves live in the registry
//! - `ShutdownToken` turns an interrupt into a drain: stop accepting,
//!   notify clients, close sockets, join every worker
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use chat_relay::Server;
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("0.0.0.0:5555").await.unwrap();
//!     Server::new(listener).run_until_ctrl_c().await.unwrap();
//! }
//! ```

pub mod client;
pub mod error;
pub mod framing;
pub mod handler;
pub mod registry;
pub mod server;
pub mod shutdown;
pub mod types;

// Re-export main types for convenience
pub use client::Client;
pub use error::ChatError;
pub use framing::{recv_frame, send_frame, QUIT_SENTINEL};
pub use handler::ConnectionHandler;
pub use registry::{Registry, NO_OTHERS_ONLINE};
pub use server::Server;
pub use shutdown::ShutdownToken;
pub use types::{ClientId, ANONYMOUS_NAME, SYSTEM_NAME};
