//! OS signal handling.

use tokio::sync::broadcast;

/// Resolve on Ctrl-C or on a programmatic shutdown, whichever comes first.
pub async fn shutdown_signal(mut shutdown: broadcast::Receiver<()>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Ctrl+C received"),
        _ = shutdown.recv() => tracing::info!("Shutdown requested"),
    }
}
