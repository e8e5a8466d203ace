use crate::events::StopOrigin;
use crate::job::Job;

use bytes::BytesMut;
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::{io, process::ExitStatus, sync::Arc, time::Duration};
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::Child,
    select,
    sync::mpsc,
    task::JoinHandle,
    time::Instant,
};

/// How long a killed process gets to be reaped before finalization goes ahead without it.
const REAP_GRACE: Duration = Duration::from_secs(2);

/// How long output readers may keep going after the process is gone. A forked grandchild that
/// escaped the kill can hold the pipes open indefinitely.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_millis(500);

enum Termination {
    Timeout,
    Stopped(StopOrigin),
    Exited(io::Result<ExitStatus>),
}

pub struct Actor {
    job: Arc<Job>,
    stop_rx: mpsc::Receiver<StopOrigin>,
    child: Child,
    // the shell leads its own group, so its pid is the group id
    pgid: Option<Pid>,
}

impl Actor {
    pub fn new(job: Arc<Job>, stop_rx: mpsc::Receiver<StopOrigin>, child: Child) -> Self {
        job.set_pid(child.id());
        let pgid = child.id().map(|pid| Pid::from_raw(pid as i32));
        Self {
            job,
            stop_rx,
            child,
            pgid,
        }
    }

    pub async fn run(mut self) {
        let job_id = self.job.id();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = self.child.stdout.take() {
            readers.push(pipe_output(Arc::clone(&self.job), stdout));
        }
        if let Some(stderr) = self.child.stderr.take() {
            readers.push(pipe_output(Arc::clone(&self.job), stderr));
        }
        tracing::info!(%job_id, command = self.job.command(), pid = ?self.child.id(), "process started");

        // 3 ways to end the process, first one wins
        let termination = select! {
            _ = tokio::time::sleep(self.job.timeout()) => Termination::Timeout,
            Some(origin) = self.stop_rx.recv() => Termination::Stopped(origin),
            exit_status = self.child.wait() => Termination::Exited(exit_status),
        };

        let reason = match &termination {
            Termination::Timeout => {
                tracing::info!(%job_id, timeout = ?self.job.timeout(), "timeout reached");
                "timeout".to_string()
            }
            Termination::Stopped(origin) => {
                tracing::info!(%job_id, %origin, "stop request received");
                origin.to_string()
            }
            Termination::Exited(Ok(status)) if status.success() => {
                tracing::info!(%job_id, "process finished successfully");
                "process finished".to_string()
            }
            Termination::Exited(Ok(status)) => {
                tracing::info!(%job_id, %status, "process finished with error");
                format!("process finished with error: {}", status)
            }
            Termination::Exited(Err(err)) => {
                tracing::warn!(%job_id, error = %err, "failed to wait on process");
                format!("process finished with error: {}", err)
            }
        };
        // the winner is fixed here, before the kill and drain
        self.job.decide(reason.clone());

        match termination {
            Termination::Exited(Ok(_)) => {
                // the shell is gone, but anything it left in the background is not
                if let Some(pgid) = self.pgid {
                    match killpg(pgid, Signal::SIGKILL) {
                        Ok(()) => tracing::info!(%job_id, %pgid, "killed leftover processes"),
                        Err(Errno::ESRCH) => {}
                        Err(err) => {
                            tracing::warn!(%job_id, %pgid, error = %err, "failed to kill process group")
                        }
                    }
                }
            }
            _ => self.kill().await,
        }

        drain(job_id, readers).await;
        self.job.finish(reason);
        tracing::info!(
            %job_id,
            reason = self.job.reason_for_exit().unwrap_or_default().as_str(),
            "job stopped"
        );
    }

    /// SIGKILL the whole process group, then reap the shell. Failures are logged and swallowed.
    async fn kill(&mut self) {
        let job_id = self.job.id();
        let (Some(pid), Some(pgid)) = (self.child.id(), self.pgid) else {
            tracing::debug!(%job_id, "process already reaped");
            return;
        };
        if let Err(err) = killpg(pgid, Signal::SIGKILL) {
            tracing::warn!(%job_id, pid, error = %err, "failed to kill process group");
            if let Err(err) = self.child.start_kill() {
                tracing::warn!(%job_id, pid, error = %err, "failed to kill process");
            }
        }
        match tokio::time::timeout(REAP_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => tracing::info!(%job_id, pid, %status, "process killed"),
            Ok(Err(err)) => tracing::warn!(%job_id, pid, error = %err, "failed to reap process"),
            Err(_) => tracing::warn!(%job_id, pid, "process still alive after kill"),
        }
    }
}

fn pipe_output<R>(job: Arc<Job>, mut reader: R) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = BytesMut::with_capacity(4096);
        loop {
            match reader.read_buf(&mut buf).await {
                Ok(n) if n > 0 => {
                    job.append_output(&buf);
                    buf.clear();
                }
                Ok(_) => break,
                Err(err) => {
                    tracing::debug!(job_id = %job.id(), error = %err, "output pipe read failed");
                    break;
                }
            }
        }
    })
}

async fn drain(job_id: uuid::Uuid, readers: Vec<JoinHandle<()>>) {
    let deadline = Instant::now() + OUTPUT_DRAIN_GRACE;
    for mut reader in readers {
        if tokio::time::timeout_at(deadline, &mut reader).await.is_err() {
            tracing::warn!(%job_id, "output pipe still open after process exit, truncating logs");
            reader.abort();
        }
    }
}
