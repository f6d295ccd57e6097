//! Signal handling for graceful shutdown

use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

/// Waits on the daemon's shutdown signals (SIGTERM, SIGINT).
pub struct ShutdownSignal;

impl ShutdownSignal {
    pub fn new() -> Self {
        Self
    }

    /// Resolve when a shutdown signal arrives.
    pub async fn wait(&self) {
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
        let mut sigint =
            signal(SignalKind::interrupt()).expect("failed to register SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                info!(signal = "SIGTERM", "shutdown requested");
            }
            _ = sigint.recv() => {
                info!(signal = "SIGINT", "shutdown requested");
            }
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
