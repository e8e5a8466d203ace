use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use joblib::error::Error as JobError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON body of every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Job(#[from] JobError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Job(err) => match err {
                JobError::DoesNotExist => StatusCode::NOT_FOUND,
                JobError::EmptyCommand
                | JobError::ExecutableNotFound(_)
                | JobError::InvalidTimeout => StatusCode::BAD_REQUEST,
                JobError::NotStartable(_) | JobError::NotStoppable(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                JobError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
                JobError::CoordinatorGone => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        } else {
            tracing::info!(%status, error = %self, "request rejected");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joblib::JobStatus;

    #[test]
    fn job_errors_map_to_status_codes() {
        let cases = [
            (JobError::DoesNotExist, StatusCode::NOT_FOUND),
            (JobError::EmptyCommand, StatusCode::BAD_REQUEST),
            (
                JobError::ExecutableNotFound("nope".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                JobError::NotStartable(JobStatus::Started),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                JobError::NotStoppable(JobStatus::Created),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (JobError::ShuttingDown, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
    }
}
