//! Basic type definitions for the chat server
//!
//! Provides the `ClientId` newtype used as the registry key, plus the
//! reserved names of the protocol.

use uuid::Uuid;

/// Sender label for server-generated announcements (join, departure,
/// shutdown). Never assigned to a connecting client by the server itself.
pub const SYSTEM_NAME: &str = "Server";

/// Display name substituted when a client sends an empty handshake payload.
pub const ANONYMOUS_NAME: &str = "anonymous";

/// Unique client identifier (newtype pattern)
///
/// Wraps a UUID v4 for type-safe client identification. Stands in for the
/// raw connection handle: a registry entry, its handler task, and its log
/// lines all share one `ClientId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Create a new random client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
