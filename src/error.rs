//! Error types for the chat server
//!
//! Every connection-level failure is a typed value: handlers react to them
//! with a state transition rather than a panic or a swallowed exception.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Connection and framing errors
///
/// All variants are local to a single connection; none of them propagate
/// past that client's handler except at startup (bind failures surface as
/// `Io` from `main`).
#[derive(Debug, Error)]
pub enum ChatError {
    /// Transport I/O failure (fatal for the connection)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection (EOF mid-frame or between frames)
    #[error("connection closed by peer")]
    PeerClosed,

    /// The bounded readiness wait elapsed before the frame transferred
    #[error("timed out waiting for socket readiness")]
    Timeout,

    /// Payload does not fit the 32-bit length prefix
    #[error("payload exceeds the 32-bit frame limit")]
    PayloadTooLarge,

    /// Targeted send to a client that is no longer registered
    #[error("client is not registered")]
    NotRegistered,
}

impl ChatError {
    /// True for failures that simply mean "this connection is gone",
    /// as opposed to an unexpected I/O condition worth logging loudly.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, ChatError::PeerClosed | ChatError::Timeout)
    }
}
