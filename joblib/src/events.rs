use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a job. Only ever moves forward: `Created -> Started -> Stopped`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Created,
    Started,
    Stopped,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Created => "created",
            JobStatus::Started => "started",
            JobStatus::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Who asked for a running job to be killed early.
///
/// The label doubles as the job's reason for exit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopOrigin {
    Api,
    ServiceShutdown,
}

impl fmt::Display for StopOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopOrigin::Api => "API",
            StopOrigin::ServiceShutdown => "Service Shutdown",
        };
        f.write_str(s)
    }
}

/// Result of a coordinated shutdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminateOutcome {
    /// every runner finished before the deadline
    Clean,
    /// the deadline elapsed while some runners were still killing or finalizing
    DeadlineExceeded { still_running: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&JobStatus::Started).unwrap();
        assert_eq!(json, "\"started\"");
        let parsed: JobStatus = serde_json::from_str("\"stopped\"").unwrap();
        assert_eq!(parsed, JobStatus::Stopped);
        assert!(serde_json::from_str::<JobStatus>("\"finished\"").is_err());
    }

    #[test]
    fn origin_labels() {
        assert_eq!(StopOrigin::Api.to_string(), "API");
        assert_eq!(StopOrigin::ServiceShutdown.to_string(), "Service Shutdown");
    }
}
