// src/engine/shutdown.rs

//! Signal handling: every SIGINT / SIGTERM becomes a
//! [`RuntimeEvent::ShutdownRequested`]. The core decides what the first and
//! second request mean.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::engine::RuntimeEvent;

/// Install the shutdown handler. Keeps forwarding signals until the runtime
/// goes away.
#[cfg(unix)]
pub fn install_shutdown_handler(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = sigterm.recv() => info!("received SIGTERM"),
                _ = sigint.recv() => info!("received SIGINT"),
            }
            if runtime_tx.send(RuntimeEvent::ShutdownRequested).await.is_err() {
                break;
            }
        }
    }))
}

#[cfg(not(unix))]
pub fn install_shutdown_handler(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("received Ctrl+C");
            if runtime_tx.send(RuntimeEvent::ShutdownRequested).await.is_err() {
                break;
            }
        }
    }))
}
