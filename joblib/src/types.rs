use std::time::Duration;
use uuid::Uuid;

pub type JobId = Uuid;
pub type Command = String;

/// Runner timeout applied to jobs created without one.
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(30);
