use crate::events::JobStatus;
use std::result;
use thiserror;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("No such job exists")]
    DoesNotExist,
    #[error("a command is required")]
    EmptyCommand,
    #[error("executable not found: {0}")]
    ExecutableNotFound(String),
    #[error("timeout must be greater than zero")]
    InvalidTimeout,
    #[error("job is unstartable because its status is {0}")]
    NotStartable(JobStatus),
    #[error("job is unstoppable because its status is {0}")]
    NotStoppable(JobStatus),
    #[error("service is shutting down")]
    ShuttingDown,
    #[error("job coordinator exited")]
    CoordinatorGone,
}

pub type Result<T> = result::Result<T, Error>;
