mod actors;
pub mod config;
pub mod error;
mod events;
pub mod job;
pub mod registry;
mod tracker;
pub mod types;

// re-export the job coord handle as if it is the job coordinator itself.
pub use actors::coordinator::JobCoordinatorHandle as JobCoordinator;
pub use config::CoordinatorConfig;
pub use events::{JobStatus, StopOrigin, TerminateOutcome};
pub use job::{Job, JobSnapshot};
pub use registry::{InMemoryRegistry, JobRegistry};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn basic() {
        let registry = Arc::new(InMemoryRegistry::new());
        let coordinator = JobCoordinator::spawn(registry.clone(), CoordinatorConfig::default());
        let echo_str = "hello world!";
        let job = coordinator
            .create_job(format!("echo -n '{}'", echo_str), None)
            .await
            .expect("job create err");
        coordinator.start(&job).await.expect("job start err");

        let outcome = coordinator
            .terminate_all(Duration::from_secs(10))
            .await
            .expect("coordinator exited");
        assert_eq!(outcome, TerminateOutcome::Clean);

        let job = registry.get(&job.id()).expect("job should be registered");
        assert_eq!(job.status(), JobStatus::Stopped);
        assert!(job.is_finished());
    }
}
