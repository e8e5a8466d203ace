use crate::types::DEFAULT_JOB_TIMEOUT;
use std::path::PathBuf;
use std::time::Duration;

/// Settings for a [`JobCoordinator`](crate::JobCoordinator).
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Timeout for jobs created without one.
    pub default_timeout: Duration,
    /// Shell that runs each command line as `<shell> -c <command>`.
    pub shell: PathBuf,
    /// Capacity of the coordinator's message queue.
    pub message_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_JOB_TIMEOUT,
            shell: PathBuf::from("bash"),
            message_capacity: 64,
        }
    }
}

impl CoordinatorConfig {
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }
}
