use tokio::signal::unix::{signal, SignalKind};

/// Resolves when SIGTERM or SIGINT arrives.
pub async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(err) => {
            tracing::error!(error = %err, "failed to install SIGTERM handler");
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for SIGINT");
            }
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => tracing::info!("Received SIGINT, initiating graceful shutdown"),
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGINT");
                sigterm.recv().await;
                tracing::info!("Received SIGTERM, initiating graceful shutdown");
            }
        }
    }
}
