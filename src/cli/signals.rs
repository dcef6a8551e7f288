//! Signal handling for graceful shutdown

use crate::graph::CancellationToken;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// Global shutdown flag
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Check if shutdown has been requested
pub fn is_shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}

/// Request shutdown
pub fn request_shutdown() {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Wait for SIGINT/SIGTERM (Ctrl+C elsewhere) and cancel `token`
///
/// Returns without cancelling if the handlers cannot be installed.
pub async fn setup_signal_handlers(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let (mut sigint, mut sigterm) =
            match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
                (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
                (Err(err), _) | (_, Err(err)) => {
                    warn!(error = %err, "Failed to install signal handlers");
                    return;
                }
            };

        tokio::select! {
            _ = sigint.recv() => {
                eprintln!("\nReceived SIGINT, cancelling...");
            }
            _ = sigterm.recv() => {
                eprintln!("\nReceived SIGTERM, cancelling...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to install Ctrl+C handler");
            return;
        }
        eprintln!("\nReceived Ctrl+C, cancelling...");
    }

    request_shutdown();
    token.cancel();
}
