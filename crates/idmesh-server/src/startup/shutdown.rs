//! Graceful shutdown handling for an idmesh node

use std::future::Future;

use tracing::{error, info};

/// Resolves on the first Ctrl+C or SIGTERM.
///
/// A handler that cannot be installed is logged and never fires.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, stopping node"),
        _ = terminate => info!("Received SIGTERM, stopping node"),
    }
}

/// Drive `server` until it exits on its own or `signal` resolves.
///
/// Returns `None` when the signal won; the caller then runs its shutdown hook
/// before stopping the server.
pub async fn serve_until<F, S, T>(server: F, signal: S) -> Option<T>
where
    F: Future<Output = T>,
    S: Future<Output = ()>,
{
    tokio::select! {
        result = server => Some(result),
        _ = signal => None,
    }
}
