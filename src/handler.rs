//! Per-connection state machine
//!
//! Drives one client through handshake, active messaging, and teardown:
//! `AwaitingName -> Active -> Closing -> Terminated`. The handler task owns
//! the read half of the connection; the write half lives in the registry so
//! broadcasts from any task can reach this client.
//!
//! Failure handling is asymmetric on purpose: only a failure on *this*
//! client's own receive ends the loop, while broadcast delivery failures to
//! other peers are absorbed by the registry (it prunes the dead peer).

use std::sync::Arc;

use tokio::net::tcp::OwnedReadHalf;
use tracing::{debug, info, warn};

use crate::framing::{self, QUIT_SENTINEL};
use crate::registry::Registry;
use crate::shutdown::ShutdownToken;
use crate::types::{ClientId, ANONYMOUS_NAME, SYSTEM_NAME};

/// Handler states. Transitions only move rightward; `Terminated` ends the
/// worker task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandlerState {
    AwaitingName,
    Active,
    Closing,
    Terminated,
}

/// Per-connection handler.
///
/// Constructed by the accept loop after the client has been registered;
/// `run` is spawned as the client's worker task.
pub struct ConnectionHandler {
    id: ClientId,
    name: String,
    reader: OwnedReadHalf,
    registry: Arc<Registry>,
    shutdown: ShutdownToken,
}

impl ConnectionHandler {
    pub fn new(
        id: ClientId,
        reader: OwnedReadHalf,
        registry: Arc<Registry>,
        shutdown: ShutdownToken,
    ) -> Self {
        Self {
            id,
            name: ANONYMOUS_NAME.to_string(),
            reader,
            registry,
            shutdown,
        }
    }

    /// Drive the state machine until `Terminated`.
    pub async fn run(mut self) {
        let mut state = HandlerState::AwaitingName;
        loop {
            state = match state {
                HandlerState::AwaitingName => self.await_name().await,
                HandlerState::Active => self.relay().await,
                HandlerState::Closing => self.close_out().await,
                HandlerState::Terminated => break,
            };
        }
    }

    /// Handshake: the first frame is the display name. Registration already
    /// happened at accept time, so success only updates the label; any
    /// failure tears the connection down without ever announcing it.
    async fn await_name(&mut self) -> HandlerState {
        let payload = tokio::select! {
            _ = self.shutdown.wait() => return self.abort().await,
            received = framing::recv_frame(&mut self.reader) => match received {
                Ok(payload) => payload,
                Err(err) => {
                    debug!("Client {} failed handshake: {}", self.id, err);
                    return self.abort().await;
                }
            },
        };

        if !payload.is_empty() {
            self.name = String::from_utf8_lossy(&payload).into_owned();
        }
        self.registry.set_name(self.id, self.name.clone()).await;
        info!("Client connected: {}", self.name);

        // Roster goes to this client only; the join notice goes to everyone.
        let roster = self.registry.list_others(self.id).await;
        if let Err(err) = self.registry.send_to(self.id, roster.as_bytes()).await {
            debug!("Client {} lost before roster reply: {}", self.id, err);
            return self.abort().await;
        }

        let notice = format!("{} joined the chat", self.name);
        self.registry.broadcast(SYSTEM_NAME, notice.as_bytes()).await;

        HandlerState::Active
    }

    /// Relay loop: each received frame is either the quit sentinel or a
    /// chat message broadcast under this client's name.
    async fn relay(&mut self) -> HandlerState {
        loop {
            let payload = tokio::select! {
                _ = self.shutdown.wait() => return HandlerState::Closing,
                received = framing::recv_frame(&mut self.reader) => match received {
                    Ok(payload) => payload,
                    Err(err) if err.is_disconnect() => {
                        debug!("Client {} receive ended: {}", self.id, err);
                        return HandlerState::Closing;
                    }
                    Err(err) => {
                        warn!("Client {} receive failed: {}", self.id, err);
                        return HandlerState::Closing;
                    }
                },
            };

            if payload == QUIT_SENTINEL {
                return HandlerState::Closing;
            }
            self.registry.broadcast(&self.name, &payload).await;
        }
    }

    /// Close the connection, drop the registry entry, announce the
    /// departure. Terminal.
    async fn close_out(&mut self) -> HandlerState {
        self.registry.remove_and_close(self.id).await;
        info!("Client disconnected: {}", self.name);

        let notice = format!("{} left the chat", self.name);
        self.registry.broadcast(SYSTEM_NAME, notice.as_bytes()).await;

        HandlerState::Terminated
    }

    /// Teardown for a client that never completed the handshake: no
    /// departure notice for a join that was never announced.
    async fn abort(&mut self) -> HandlerState {
        self.registry.remove_and_close(self.id).await;
        HandlerState::Terminated
    }
}
