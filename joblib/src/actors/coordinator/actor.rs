use super::messages::CoordinatorMessage;
use crate::actors::worker;
use crate::config::CoordinatorConfig;
use crate::error::{Error, Result};
use crate::events::{JobStatus, StopOrigin};
use crate::job::Job;
use crate::registry::JobRegistry;
use crate::tracker::RunningTracker;
use crate::types::Command;

use std::env;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Serializes every lifecycle transition, so check-then-act on a job's status never races
/// another request for the same job.
pub struct JobCoordinator {
    inbox: mpsc::Receiver<CoordinatorMessage>,
    registry: Arc<dyn JobRegistry>,
    tracker: RunningTracker,
    config: CoordinatorConfig,
    shutting_down: bool,
}

impl JobCoordinator {
    pub fn spawn(
        inbox: mpsc::Receiver<CoordinatorMessage>,
        registry: Arc<dyn JobRegistry>,
        config: CoordinatorConfig,
    ) {
        let actor = Self {
            inbox,
            registry,
            tracker: RunningTracker::default(),
            config,
            shutting_down: false,
        };
        tokio::spawn(async move { actor.run().await });
    }

    async fn run(mut self) {
        use self::CoordinatorMessage::*;
        while let Some(msg) = self.inbox.recv().await {
            match msg {
                CreateJob {
                    command,
                    timeout,
                    response,
                } => {
                    let _ = response.send(self.create_job(command, timeout));
                }
                StartJob { job, response } => {
                    let _ = response.send(self.start_job(job));
                }
                StopJob {
                    job,
                    origin,
                    response,
                } => {
                    let _ = response.send(self.stop_job(&job, origin));
                }
                BeginShutdown { response } => {
                    let _ = response.send(self.begin_shutdown());
                }
            }
        }
    }

    fn create_job(&mut self, command: Command, timeout: Option<Duration>) -> Result<Arc<Job>> {
        let command = validate_command(command)?;
        let timeout = timeout.unwrap_or(self.config.default_timeout);
        if timeout.is_zero() {
            return Err(Error::InvalidTimeout);
        }
        let job = Arc::new(Job::new(command, timeout));
        self.registry.put(Arc::clone(&job));
        tracing::info!(job_id = %job.id(), command = job.command(), ?timeout, "job created");
        Ok(job)
    }

    fn start_job(&mut self, job: Arc<Job>) -> Result<()> {
        if self.shutting_down {
            return Err(Error::ShuttingDown);
        }
        // status flips before the runner exists, so a fast runner cannot be overwritten
        let stop_rx = job.mark_started()?;
        let guard = self.tracker.acquire();
        tracing::info!(job_id = %job.id(), running = self.tracker.running(), "job started");
        worker::spawn(job, stop_rx, &self.config.shell, guard);
        Ok(())
    }

    fn stop_job(&mut self, job: &Job, origin: StopOrigin) -> Result<()> {
        job.request_stop(origin)?;
        tracing::info!(job_id = %job.id(), %origin, "job stop requested");
        Ok(())
    }

    fn begin_shutdown(&mut self) -> RunningTracker {
        self.shutting_down = true;
        let mut signalled = 0;
        for job in self.registry.list() {
            if job.status() != JobStatus::Started {
                continue;
            }
            match job.request_stop(StopOrigin::ServiceShutdown) {
                Ok(()) => signalled += 1,
                // finished on its own in the meantime
                Err(err) => tracing::debug!(job_id = %job.id(), error = %err, "job not signalled"),
            }
        }
        tracing::info!(signalled, running = self.tracker.running(), "terminating all jobs");
        self.tracker.clone()
    }
}

/// Reject commands whose first word cannot be resolved to an executable, the way a shell would
/// look it up.
fn validate_command(command: Command) -> Result<Command> {
    let command = command.trim();
    let executable = command.split_whitespace().next().ok_or(Error::EmptyCommand)?;
    if resolve_executable(executable) {
        Ok(command.to_string())
    } else {
        Err(Error::ExecutableNotFound(executable.to_string()))
    }
}

fn resolve_executable(name: &str) -> bool {
    if name.contains('/') {
        return is_executable(Path::new(name));
    }
    env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).any(|dir| is_executable(&dir.join(name))))
        .unwrap_or(false)
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_trimmed() {
        assert_eq!(validate_command("  echo hi  ".into()).unwrap(), "echo hi");
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(matches!(
            validate_command("   ".into()),
            Err(Error::EmptyCommand)
        ));
    }

    #[test]
    fn unknown_executable_is_rejected() {
        match validate_command("definitely-not-a-real-binary --flag".into()) {
            Err(Error::ExecutableNotFound(name)) => {
                assert_eq!(name, "definitely-not-a-real-binary")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn absolute_paths_are_checked_directly() {
        assert!(resolve_executable("/bin/sh"));
        assert!(!resolve_executable("/nonexistent/sh"));
    }
}
