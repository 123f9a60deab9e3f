//! Server: accept loop and coordinated shutdown
//!
//! Owns the bound listener, the shared registry, and the shutdown token.
//! Each accepted connection is registered and handed to a
//! `ConnectionHandler` spawned into a `JoinSet`, so shutdown can wait on
//! every worker with one explicit barrier instead of relying on detached
//! tasks winding down on their own.
//!
//! Shutdown is two signals: the public token stops the accept loop, and a
//! private drain signal releases the connection handlers only after the
//! shutdown notice has been broadcast and every connection force-closed.
//! Handlers waking on the first signal would race the notice; ordering the
//! signals keeps the drain sequence strict.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::ChatError;
use crate::handler::ConnectionHandler;
use crate::registry::Registry;
use crate::shutdown::ShutdownToken;
use crate::types::{ClientId, SYSTEM_NAME};

/// Announcement broadcast to all clients as shutdown begins.
const SHUTDOWN_NOTICE: &[u8] = b"server is shutting down";

/// The chat server: acceptor plus shutdown coordinator.
pub struct Server {
    listener: TcpListener,
    registry: Arc<Registry>,
    shutdown: ShutdownToken,
    drain: ShutdownToken,
}

impl Server {
    /// Wrap an already-bound listener. Binding stays with the caller so
    /// startup failures surface before any server machinery spins up.
    pub fn new(listener: TcpListener) -> Self {
        Self {
            listener,
            registry: Arc::new(Registry::new()),
            shutdown: ShutdownToken::new(),
            drain: ShutdownToken::new(),
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Shared handle to the client registry.
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Token that stops the accept loop and starts the drain when
    /// triggered, from any task.
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.clone()
    }

    /// Accept connections until shutdown triggers, then drain every live
    /// connection before returning.
    pub async fn run(self) -> Result<(), ChatError> {
        let Server {
            listener,
            registry,
            shutdown,
            drain,
        } = self;

        let mut workers = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!("New connection from {}", peer);
                        let id = ClientId::new();
                        let (reader, writer) = stream.into_split();
                        registry.register(id, writer).await;

                        let handler = ConnectionHandler::new(
                            id,
                            reader,
                            Arc::clone(&registry),
                            drain.clone(),
                        );
                        workers.spawn(handler.run());
                    }
                    Err(err) if shutdown.is_triggered() => {
                        debug!("Accept interrupted by shutdown: {}", err);
                        break;
                    }
                    Err(err) => {
                        warn!("Failed to accept connection: {}", err);
                    }
                },
            }
        }

        // Drain sequence. Each step completes before the next: flag, then
        // listener, then notice, then force-close, then handler release,
        // then the join barrier, then the empty registry.
        shutdown.trigger();
        drop(listener);

        let live = registry.len().await;
        info!("Shutting down, draining {} connection(s)", live);
        registry.broadcast(SYSTEM_NAME, SHUTDOWN_NOTICE).await;
        registry.close_all().await;
        drain.trigger();

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                warn!("Connection worker did not finish cleanly: {}", err);
            }
        }

        registry.clear().await;
        info!("Shutdown complete");

        Ok(())
    }

    /// Run until an interrupt signal arrives, then drain and return.
    pub async fn run_until_ctrl_c(self) -> Result<(), ChatError> {
        let shutdown = self.shutdown_token();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, shutting down");
                    shutdown.trigger();
                }
                Err(err) => warn!("Failed to install interrupt handler: {}", err),
            }
        });

        self.run().await
    }
}
