mod actor;
mod messages;

use self::{
    actor::JobCoordinator,
    messages::CoordinatorMessage::{self, BeginShutdown, CreateJob, StartJob, StopJob},
};
use crate::config::CoordinatorConfig;
use crate::error::{Error, Result};
use crate::events::{StopOrigin, TerminateOutcome};
use crate::job::Job;
use crate::registry::JobRegistry;
use crate::types::{Command, JobId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// A `JobCoordinator` which creates, starts and stops jobs and shuts them all down.
///
/// This struct is actually an actor handle, the real work is done in the actor spawned by
/// `JobCoordinator::spawn`, but from the user perspective all that matters is that this struct
/// provides methods for managing jobs. The handle can be cloned freely across tasks.
///
/// Reads go straight to the injected registry. Lifecycle changes go through the actor so two
/// requests for the same job are never interleaved.
#[derive(Clone)]
pub struct JobCoordinatorHandle {
    sender: mpsc::Sender<CoordinatorMessage>,
    registry: Arc<dyn JobRegistry>,
}

impl JobCoordinatorHandle {
    /// Spawn a new coordinator over `registry`.
    pub fn spawn(registry: Arc<dyn JobRegistry>, config: CoordinatorConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.message_capacity);
        JobCoordinator::spawn(receiver, Arc::clone(&registry), config);
        Self { sender, registry }
    }

    /// Validate `command` and store a new job for it in `created` state.
    ///
    /// `timeout` falls back to the configured default.
    pub async fn create_job(&self, command: Command, timeout: Option<Duration>) -> Result<Arc<Job>> {
        self.request(|response| CreateJob {
            command,
            timeout,
            response,
        })
        .await?
    }

    pub fn get_job(&self, job_id: JobId) -> Result<Arc<Job>> {
        self.registry.get(&job_id).ok_or(Error::DoesNotExist)
    }

    pub fn list_jobs(&self) -> Vec<Arc<Job>> {
        self.registry.list()
    }

    /// Start a `created` job. Returns as soon as the runner is spawned.
    pub async fn start(&self, job: &Arc<Job>) -> Result<()> {
        let job = Arc::clone(job);
        self.request(|response| StartJob { job, response }).await?
    }

    /// Signal a `started` job to be killed, marking it `stopped` right away.
    pub async fn stop(&self, job: &Arc<Job>, origin: StopOrigin) -> Result<()> {
        let job = Arc::clone(job);
        self.request(|response| StopJob {
            job,
            origin,
            response,
        })
        .await?
    }

    /// Stop every started job and wait, at most `deadline`, for all runners to finish.
    ///
    /// New starts are refused from here on.
    pub async fn terminate_all(&self, deadline: Duration) -> Result<TerminateOutcome> {
        let tracker = self.request(|response| BeginShutdown { response }).await?;
        match tokio::time::timeout(deadline, tracker.wait_idle()).await {
            Ok(()) => {
                tracing::info!("all jobs terminated");
                Ok(TerminateOutcome::Clean)
            }
            Err(_) => {
                let still_running = tracker.running();
                tracing::warn!(still_running, ?deadline, "deadline exceeded while terminating jobs");
                Ok(TerminateOutcome::DeadlineExceeded { still_running })
            }
        }
    }

    async fn request<T>(
        &self,
        msg: impl FnOnce(oneshot::Sender<T>) -> CoordinatorMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(msg(tx))
            .await
            .map_err(|_| Error::CoordinatorGone)?;
        rx.await.map_err(|_| Error::CoordinatorGone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::JobStatus;
    use crate::registry::InMemoryRegistry;

    fn coordinator() -> JobCoordinatorHandle {
        JobCoordinatorHandle::spawn(
            Arc::new(InMemoryRegistry::new()),
            CoordinatorConfig::default(),
        )
    }

    async fn wait_finished(job: &Job) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        while !job.is_finished() {
            assert!(
                tokio::time::Instant::now() < deadline,
                "job {} did not finish",
                job.id()
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    #[tokio::test]
    async fn echo_runs_to_completion() {
        let coordinator = coordinator();
        let job = coordinator
            .create_job("echo hello".into(), None)
            .await
            .unwrap();
        assert_eq!(job.status(), JobStatus::Created);
        assert_eq!(job.timeout(), crate::types::DEFAULT_JOB_TIMEOUT);

        coordinator.start(&job).await.unwrap();
        wait_finished(&job).await;

        let snapshot = coordinator.get_job(job.id()).unwrap().snapshot();
        assert_eq!(snapshot.status, JobStatus::Stopped);
        assert_eq!(snapshot.reason_for_exit, "process finished");
        assert_eq!(snapshot.logs, "hello\n");
    }

    #[tokio::test]
    async fn unknown_job_does_not_exist() {
        let coordinator = coordinator();
        assert!(matches!(
            coordinator.get_job(uuid::Uuid::new_v4()),
            Err(Error::DoesNotExist)
        ));
    }

    #[tokio::test]
    async fn create_rejects_bad_input() {
        let coordinator = coordinator();
        assert!(matches!(
            coordinator.create_job("".into(), None).await,
            Err(Error::EmptyCommand)
        ));
        assert!(matches!(
            coordinator.create_job("no-such-binary-here".into(), None).await,
            Err(Error::ExecutableNotFound(_))
        ));
        assert!(matches!(
            coordinator
                .create_job("echo hi".into(), Some(Duration::ZERO))
                .await,
            Err(Error::InvalidTimeout)
        ));
        assert!(coordinator.list_jobs().is_empty());
    }

    #[tokio::test]
    async fn starting_twice_is_rejected() {
        let coordinator = coordinator();
        let job = coordinator
            .create_job("sleep 30".into(), None)
            .await
            .unwrap();
        coordinator.start(&job).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let pid = job.pid();

        assert!(matches!(
            coordinator.start(&job).await,
            Err(Error::NotStartable(JobStatus::Started))
        ));
        assert_eq!(job.pid(), pid);

        coordinator.stop(&job, StopOrigin::Api).await.unwrap();
        wait_finished(&job).await;
        assert!(matches!(
            coordinator.start(&job).await,
            Err(Error::NotStartable(JobStatus::Stopped))
        ));
    }

    #[tokio::test]
    async fn stopping_unstarted_job_is_rejected() {
        let coordinator = coordinator();
        let job = coordinator.create_job("true".into(), None).await.unwrap();
        assert!(matches!(
            coordinator.stop(&job, StopOrigin::Api).await,
            Err(Error::NotStoppable(JobStatus::Created))
        ));
        assert_eq!(job.status(), JobStatus::Created);
        assert_eq!(job.reason_for_exit(), None);
    }

    #[tokio::test]
    async fn stop_records_origin() {
        let coordinator = coordinator();
        let job = coordinator
            .create_job("sleep 30".into(), None)
            .await
            .unwrap();
        coordinator.start(&job).await.unwrap();
        coordinator.stop(&job, StopOrigin::Api).await.unwrap();

        // authoritative as soon as the call returns
        assert_eq!(job.status(), JobStatus::Stopped);
        assert_eq!(job.reason_for_exit().as_deref(), Some("API"));

        // a second stop is turned away without blocking
        let second = tokio::time::timeout(
            Duration::from_secs(1),
            coordinator.stop(&job, StopOrigin::Api),
        )
        .await
        .expect("second stop must not block");
        assert!(matches!(second, Err(Error::NotStoppable(JobStatus::Stopped))));

        wait_finished(&job).await;
        assert_eq!(job.reason_for_exit().as_deref(), Some("API"));
    }

    #[tokio::test]
    async fn per_job_timeout() {
        let coordinator = coordinator();
        let job = coordinator
            .create_job("sleep 30".into(), Some(Duration::from_millis(200)))
            .await
            .unwrap();
        coordinator.start(&job).await.unwrap();
        wait_finished(&job).await;
        assert_eq!(job.reason_for_exit().as_deref(), Some("timeout"));
        assert_eq!(job.status(), JobStatus::Stopped);
    }

    #[tokio::test]
    async fn terminate_all_cleanly() {
        let coordinator = coordinator();
        let mut jobs = Vec::new();
        for _ in 0..3 {
            let job = coordinator
                .create_job("sleep 30".into(), None)
                .await
                .unwrap();
            coordinator.start(&job).await.unwrap();
            jobs.push(job);
        }
        let idle = coordinator.create_job("true".into(), None).await.unwrap();

        let outcome = coordinator
            .terminate_all(Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(outcome, TerminateOutcome::Clean);
        for job in &jobs {
            assert!(job.is_finished());
            assert_eq!(job.status(), JobStatus::Stopped);
            assert_eq!(job.reason_for_exit().as_deref(), Some("Service Shutdown"));
        }
        assert_eq!(idle.status(), JobStatus::Created);

        assert!(matches!(
            coordinator.start(&idle).await,
            Err(Error::ShuttingDown)
        ));
    }

    // The held guard stands in for a runner that crashed without unwinding. Real runners release
    // their slot within the reap and drain graces.
    #[tokio::test]
    async fn terminate_all_reports_deadline() {
        let coordinator = coordinator();
        let mut jobs = Vec::new();
        for _ in 0..3 {
            let job = coordinator
                .create_job("sleep 30".into(), None)
                .await
                .unwrap();
            coordinator.start(&job).await.unwrap();
            jobs.push(job);
        }

        let tracker = coordinator
            .request(|response| BeginShutdown { response })
            .await
            .unwrap();
        let _stuck = tracker.acquire();

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            coordinator.terminate_all(Duration::from_millis(300)),
        )
        .await
        .unwrap()
        .unwrap();
        assert!(matches!(
            outcome,
            TerminateOutcome::DeadlineExceeded { still_running } if still_running >= 1
        ));

        // the kills still land afterwards
        for job in &jobs {
            wait_finished(job).await;
            assert_eq!(job.reason_for_exit().as_deref(), Some("Service Shutdown"));
        }
    }
}
