use crate::error;
use crate::events::StopOrigin;
use crate::job::Job;
use crate::tracker::RunningTracker;
use crate::types::Command;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum CoordinatorMessage {
    CreateJob {
        command: Command,
        timeout: Option<Duration>,
        response: oneshot::Sender<error::Result<Arc<Job>>>,
    },
    StartJob {
        job: Arc<Job>,
        response: oneshot::Sender<error::Result<()>>,
    },
    StopJob {
        job: Arc<Job>,
        origin: StopOrigin,
        response: oneshot::Sender<error::Result<()>>,
    },
    /// Refuse further starts, signal every started job, and hand back the tracker to wait on.
    BeginShutdown {
        response: oneshot::Sender<RunningTracker>,
    },
}
