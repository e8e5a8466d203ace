use crate::error::{Error, Result};
use crate::events::{JobStatus, StopOrigin};
use crate::types::{Command, JobId};

use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;

/// A job is one shell command and the single OS process spawned for it.
///
/// Identity, command and timeout are fixed at creation. Everything that changes over the job's
/// life sits behind one per-record lock, so `status` and `reason_for_exit` are always read
/// together and never torn across threads.
#[derive(Debug)]
pub struct Job {
    id: JobId,
    command: Command,
    timeout: Duration,
    state: Mutex<JobState>,
    stop_tx: mpsc::Sender<StopOrigin>,
    // handed to the one and only runner when the job starts
    stop_rx: Mutex<Option<mpsc::Receiver<StopOrigin>>>,
}

#[derive(Debug)]
struct JobState {
    status: JobStatus,
    output: BytesMut,
    logs: String,
    reason_for_exit: Option<String>,
    pid: Option<u32>,
    finished: bool,
}

/// The externally visible form of a job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: JobId,
    pub command: Command,
    pub status: JobStatus,
    pub logs: String,
    #[serde(rename = "reasonForExit")]
    pub reason_for_exit: String,
}

impl Job {
    pub fn new(command: Command, timeout: Duration) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel(1);
        Self {
            id: uuid::Uuid::new_v4(),
            command,
            timeout,
            state: Mutex::new(JobState {
                status: JobStatus::Created,
                output: BytesMut::new(),
                logs: String::new(),
                reason_for_exit: None,
                pid: None,
                finished: false,
            }),
            stop_tx,
            stop_rx: Mutex::new(Some(stop_rx)),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn status(&self) -> JobStatus {
        self.state().status
    }

    pub fn reason_for_exit(&self) -> Option<String> {
        self.state().reason_for_exit.clone()
    }

    pub fn logs(&self) -> String {
        self.state().logs.clone()
    }

    /// Process id the job's shell was spawned with. Kept after the process is reaped, so it may
    /// since have been reused.
    pub(crate) fn pid(&self) -> Option<u32> {
        self.state().pid
    }

    /// Whether the runner has finalized the job (process gone, logs frozen).
    pub fn is_finished(&self) -> bool {
        self.state().finished
    }

    pub fn snapshot(&self) -> JobSnapshot {
        let state = self.state();
        JobSnapshot {
            id: self.id,
            command: self.command.clone(),
            status: state.status,
            logs: state.logs.clone(),
            reason_for_exit: state.reason_for_exit.clone().unwrap_or_default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, JobState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `created -> started`. Returns the stop receiver for the runner that is about to be spawned.
    pub(crate) fn mark_started(&self) -> Result<mpsc::Receiver<StopOrigin>> {
        let mut state = self.state();
        if state.status != JobStatus::Created {
            return Err(Error::NotStartable(state.status));
        }
        let stop_rx = self
            .stop_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(Error::NotStartable(state.status))?;
        state.status = JobStatus::Started;
        Ok(stop_rx)
    }

    /// `started -> stopped`, signalling the runner to kill the process.
    ///
    /// The status flip happens here, ahead of the runner, and the origin becomes the reason for
    /// exit unless the runner already recorded one.
    pub(crate) fn request_stop(&self, origin: StopOrigin) -> Result<()> {
        let mut state = self.state();
        if state.status != JobStatus::Started {
            return Err(Error::NotStoppable(state.status));
        }
        self.signal_stop(origin);
        state.status = JobStatus::Stopped;
        state
            .reason_for_exit
            .get_or_insert_with(|| origin.to_string());
        Ok(())
    }

    fn signal_stop(&self, origin: StopOrigin) {
        // a full slot means a stop is already pending, which is just as good
        if let Err(err) = self.stop_tx.try_send(origin) {
            tracing::debug!(job_id = %self.id, %origin, error = %err, "stop signal not queued");
        }
    }

    /// Settle how the job ends as soon as the runner knows, ahead of the kill and output drain.
    /// A stop arriving after this is turned away and cannot replace the reason.
    pub(crate) fn decide(&self, reason: String) {
        let mut state = self.state();
        state.status = JobStatus::Stopped;
        state.reason_for_exit.get_or_insert(reason);
    }

    pub(crate) fn set_pid(&self, pid: Option<u32>) {
        self.state().pid = pid;
    }

    pub(crate) fn append_output(&self, bytes: &[u8]) {
        let mut state = self.state();
        if !state.finished {
            state.output.extend_from_slice(bytes);
        }
    }

    /// Freeze output into logs and settle the terminal state. Later calls are no-ops.
    pub(crate) fn finish(&self, reason: String) {
        let mut state = self.state();
        if state.finished {
            return;
        }
        state.logs = String::from_utf8_lossy(&state.output).into_owned();
        state.status = JobStatus::Stopped;
        state.reason_for_exit.get_or_insert(reason);
        state.finished = true;
    }
}
