//! Client struct definition
//!
//! Represents one connected peer as seen by the registry: its id, display
//! name, and the exclusively owned write half of the connection. The read
//! half lives with the connection handler task.

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;

use crate::error::ChatError;
use crate::framing;
use crate::types::{ClientId, ANONYMOUS_NAME};

/// Connected client information
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for this client
    pub id: ClientId,
    /// Display name, fixed at handshake completion
    name: String,
    /// Write half of the connection; dropped when the client is removed
    writer: OwnedWriteHalf,
}

impl Client {
    /// Create a new client record around the write half of an accepted
    /// connection. The name starts at the anonymous sentinel and is
    /// replaced once the handshake frame arrives.
    pub fn new(id: ClientId, writer: OwnedWriteHalf) -> Self {
        Self {
            id,
            name: ANONYMOUS_NAME.to_string(),
            writer,
        }
    }

    /// Frame and send a payload to this client.
    pub async fn send(&mut self, payload: &[u8]) -> Result<(), ChatError> {
        framing::send_frame(&mut self.writer, payload).await
    }

    /// Shut down the write half. Safe to call on an already-closed
    /// connection; errors are ignored.
    pub async fn close(&mut self) {
        let _ = self.writer.shutdown().await;
    }

    /// Get the display name for this client
    pub fn display_name(&self) -> &str {
        &self.name
    }

    /// Set the client's display name
    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }
}
