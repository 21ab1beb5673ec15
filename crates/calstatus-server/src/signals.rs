//! Stopping the poll loop on SIGINT/SIGTERM.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::error::{ServerError, ServerResult};

/// Turns process signals into a shutdown flag.
#[derive(Debug, Clone)]
pub struct SignalHandler {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalHandler {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Starts listening for SIGTERM and SIGINT in a background task.
    ///
    /// # Errors
    ///
    /// Fails if the signal handlers cannot be registered.
    #[cfg(unix)]
    pub fn spawn_listener(&self) -> ServerResult<()> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate()).map_err(ServerError::Signal)?;
        let mut sigint = signal(SignalKind::interrupt()).map_err(ServerError::Signal)?;
        let tx = self.tx.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("received SIGTERM, stopping"),
                _ = sigint.recv() => info!("received SIGINT, stopping"),
            }
            let _ = tx.send(true);
        });
        Ok(())
    }

    /// Starts listening for Ctrl+C in a background task.
    #[cfg(not(unix))]
    pub fn spawn_listener(&self) -> ServerResult<()> {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("received Ctrl+C, stopping");
                let _ = tx.send(true);
            }
        });
        Ok(())
    }

    pub fn trigger_shutdown(&self) {
        let _ = self.tx.send(true);
    }

    /// A future-like handle that resolves once shutdown is requested.
    pub fn shutdown(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.rx.clone(),
            _keepalive: None,
        }
    }
}

/// Resolves when shutdown is requested (or the handler is dropped).
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
    _keepalive: Option<Arc<watch::Sender<bool>>>,
}

impl ShutdownSignal {
    /// A signal that never fires, for callers without signal handling.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            rx,
            _keepalive: Some(Arc::new(tx)),
        }
    }

    pub async fn wait(&mut self) {
        // wait_for returns immediately when the flag is already set
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}
