//! Shared client registry
//!
//! The single mutually-exclusive collection of connected clients. The lock
//! lives inside this type; every read and write of the collection,
//! including broadcast iteration, goes through a method that holds it for
//! the full operation, so no caller can ever observe a partially updated
//! collection.
//!
//! Insertion order is preserved: listing and broadcast delivery iterate
//! clients in the order they registered.

use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::client::Client;
use crate::error::ChatError;
use crate::types::ClientId;

/// Returned by [`Registry::list_others`] when nobody else is connected.
pub const NO_OTHERS_ONLINE: &str = "no other users online";

/// Registry of connected clients behind one coarse lock.
///
/// Critical sections are short (list mutation, label construction, one
/// bounded frame send per client); contention is dominated by socket I/O,
/// not by registry access.
#[derive(Debug, Default)]
pub struct Registry {
    clients: Mutex<Vec<Client>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(Vec::new()),
        }
    }

    /// Register a newly accepted connection. The display name starts at the
    /// anonymous sentinel until the handshake frame arrives.
    pub async fn register(&self, id: ClientId, writer: OwnedWriteHalf) {
        let mut clients = self.clients.lock().await;
        clients.push(Client::new(id, writer));
    }

    /// Update a client's display name after handshake completion.
    pub async fn set_name(&self, id: ClientId, name: String) {
        let mut clients = self.clients.lock().await;
        if let Some(client) = clients.iter_mut().find(|c| c.id == id) {
            client.set_name(name);
        }
    }

    /// Remove every entry matching `id`. Removing an absent id is a no-op.
    pub async fn unregister(&self, id: ClientId) {
        let mut clients = self.clients.lock().await;
        clients.retain(|c| c.id != id);
    }

    /// Close and remove one client in a single critical section.
    pub async fn remove_and_close(&self, id: ClientId) {
        let mut clients = self.clients.lock().await;
        if let Some(pos) = clients.iter().position(|c| c.id == id) {
            let mut client = clients.remove(pos);
            client.close().await;
        }
    }

    /// Send one frame to one registered client (the handshake roster reply
    /// goes through here rather than through `broadcast`).
    pub async fn send_to(&self, id: ClientId, payload: &[u8]) -> Result<(), ChatError> {
        let mut clients = self.clients.lock().await;
        let client = clients
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(ChatError::NotRegistered)?;
        client.send(payload).await
    }

    /// Broadcast `"[sender] payload"` to every registered client, the
    /// sender's own connection included. Every client whose send fails is
    /// closed and removed before the pass ends: delivery failure is a
    /// disconnect signal, not something to ignore.
    pub async fn broadcast(&self, sender: &str, payload: &[u8]) {
        let mut frame = Vec::with_capacity(sender.len() + payload.len() + 3);
        frame.push(b'[');
        frame.extend_from_slice(sender.as_bytes());
        frame.extend_from_slice(b"] ");
        frame.extend_from_slice(payload);

        let mut clients = self.clients.lock().await;
        let mut index = 0;
        while index < clients.len() {
            match clients[index].send(&frame).await {
                Ok(()) => index += 1,
                Err(err) => {
                    let mut dead = clients.remove(index);
                    debug!("Dropping client {} mid-broadcast: {}", dead.id, err);
                    dead.close().await;
                }
            }
        }
    }

    /// Comma-joined display names of everyone except `id`, or the
    /// "no other users online" sentinel when that set is empty.
    pub async fn list_others(&self, id: ClientId) -> String {
        let clients = self.clients.lock().await;
        let names: Vec<&str> = clients
            .iter()
            .filter(|c| c.id != id)
            .map(|c| c.display_name())
            .collect();

        if names.is_empty() {
            NO_OTHERS_ONLINE.to_string()
        } else {
            names.join(", ")
        }
    }

    /// Shut down every registered connection's write half. Used by the
    /// shutdown sequence; the lock is released before worker tasks are
    /// joined.
    pub async fn close_all(&self) {
        let mut clients = self.clients.lock().await;
        for client in clients.iter_mut() {
            client.close().await;
        }
        if !clients.is_empty() {
            warn!("Force-closed {} connection(s)", clients.len());
        }
    }

    /// Drop every entry. Last step of the shutdown sequence.
    pub async fn clear(&self) {
        let mut clients = self.clients.lock().await;
        clients.clear();
    }

    pub async fn len(&self) -> usize {
        self.clients.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.lock().await.is_empty()
    }
}
