//! Shutdown signalling
//!
//! A clonable token decoupling the OS-level interrupt from the shutdown
//! logic: any component can trigger it, poll it, or await it. An atomic
//! guard makes the first trigger the only one that takes effect, so a
//! ctrl-c and a normal accept-loop exit can race without double-running
//! the shutdown sequence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

/// Process-wide shutdown token.
#[derive(Debug, Clone)]
pub struct ShutdownToken {
    triggered: Arc<AtomicBool>,
    notify: Arc<watch::Sender<bool>>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        let (notify, _) = watch::channel(false);
        Self {
            triggered: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(notify),
        }
    }

    /// Raise the shutdown flag. Returns `true` only for the first call;
    /// later calls (from a second signal, or from the accept loop winding
    /// down) are no-ops.
    pub fn trigger(&self) -> bool {
        if self.triggered.swap(true, Ordering::SeqCst) {
            return false;
        }
        let _ = self.notify.send(true);
        true
    }

    /// Has shutdown been requested?
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Completes once shutdown has been requested; immediately if it
    /// already was. Safe to recreate inside a `select!` loop.
    pub async fn wait(&self) {
        let mut rx = self.notify.subscribe();
        if *rx.borrow() {
            return;
        }
        // Err means the sender vanished, which only happens if every token
        // clone is gone; treat it the same as a trigger.
        let _ = rx.changed().await;
    }
}

impl Default for ShutdownToken {
    fn default() -> Self {
        Self::new()
    }
}
