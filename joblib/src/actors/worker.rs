mod actor;

use crate::events::StopOrigin;
use crate::job::Job;
use crate::tracker::RunningGuard;
use actor::Actor;
use std::{path::Path, process::Stdio, sync::Arc};
use tokio::{process, sync::mpsc, task::JoinHandle};

/// Spawn the runner for a job that has just been marked started.
///
/// The shell gets its own process group so a kill reaches everything the command line forked.
/// A spawn failure only fails this job: it is recorded as the reason for exit.
pub(crate) fn spawn(
    job: Arc<Job>,
    stop_rx: mpsc::Receiver<StopOrigin>,
    shell: &Path,
    guard: RunningGuard,
) -> JoinHandle<()> {
    let mut command = process::Command::new(shell);
    command
        .arg("-c")
        .arg(job.command())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .kill_on_drop(true);

    tokio::spawn(async move {
        let _guard = guard;
        match command.spawn() {
            Ok(child) => Actor::new(job, stop_rx, child).run().await,
            Err(err) => {
                tracing::error!(job_id = %job.id(), error = %err, "failed to start process");
                job.finish(format!("failed to start process: {}", err));
            }
        }
    })
}
