mod config;
mod error;
mod interceptors;
mod services;
mod shutdown;

use clap::Parser;
use config::ServerConfig;
use joblib::{InMemoryRegistry, JobCoordinator, TerminateOutcome};
use services::jobservice::{self, JobService};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    serve(ServerConfig::parse()).await
}

async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(?config, "Server is starting...");

    // jobs live in memory only and are lost when the process exits
    let registry = Arc::new(InMemoryRegistry::new());
    let coordinator = JobCoordinator::spawn(registry, config.coordinator_config());
    let app = jobservice::router(JobService::new(coordinator.clone()));

    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "Server is ready to handle requests");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await?;

    tracing::info!(grace = ?config.shutdown_grace(), "Server is shutting down...");
    match coordinator.terminate_all(config.shutdown_grace()).await? {
        TerminateOutcome::Clean => tracing::info!("no jobs left running"),
        TerminateOutcome::DeadlineExceeded { still_running } => {
            tracing::warn!(still_running, "exiting with jobs still being killed")
        }
    }
    tracing::info!("Server stopped");
    Ok(())
}
