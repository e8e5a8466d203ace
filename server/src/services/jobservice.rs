pub mod authz;
use self::authz::AuthzDb;

use crate::error::ApiError;
use crate::interceptors::auth::verify_auth;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use joblib::{Job, JobCoordinator, JobSnapshot, JobStatus, StopOrigin};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Shared state behind every handler. Cheap to clone.
#[derive(Clone)]
pub struct JobService {
    coordinator: JobCoordinator,
    authz_db: Arc<AuthzDb>, // immutable pre-populated mock db
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateJobRequest {
    #[serde(default)]
    command: String,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ChangeStatusRequest {
    status: JobStatus,
}

impl JobService {
    pub fn new(coordinator: JobCoordinator) -> Self {
        Self {
            coordinator,
            authz_db: Arc::new(AuthzDb::default()),
        }
    }

    pub fn authz_db(&self) -> &AuthzDb {
        &self.authz_db
    }

    fn find_job(&self, job_id: &str) -> Result<Arc<Job>, ApiError> {
        // an id that is not even a uuid cannot name a job
        let job_id = Uuid::parse_str(job_id).map_err(|_| joblib::error::Error::DoesNotExist)?;
        Ok(self.coordinator.get_job(job_id)?)
    }
}

/// Build the jobs router: `POST /jobs`, `GET /jobs`, `GET /jobs/{job_id}`, `PUT /jobs/{job_id}`.
pub fn router(service: JobService) -> Router {
    Router::new()
        .route("/jobs", post(create_job).get(list_jobs))
        .route("/jobs/{job_id}", get(get_job).put(change_job_status))
        .route_layer(middleware::from_fn_with_state(service.clone(), verify_auth))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Create a job without starting it.
async fn create_job(
    State(service): State<JobService>,
    payload: Result<Json<CreateJobRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|err| ApiError::BadRequest(err.body_text()))?;
    let timeout = request.timeout_seconds.map(Duration::from_secs);
    let job = service
        .coordinator
        .create_job(request.command, timeout)
        .await?;
    let location = format!("/jobs/{}", job.id());
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(job.snapshot()),
    ))
}

async fn list_jobs(State(service): State<JobService>) -> Json<Vec<JobSnapshot>> {
    Json(
        service
            .coordinator
            .list_jobs()
            .iter()
            .map(|job| job.snapshot())
            .collect(),
    )
}

async fn get_job(
    State(service): State<JobService>,
    Path(job_id): Path<String>,
) -> Result<Json<JobSnapshot>, ApiError> {
    Ok(Json(service.find_job(&job_id)?.snapshot()))
}

/// Start or stop a job, depending on the requested status.
async fn change_job_status(
    State(service): State<JobService>,
    Path(job_id): Path<String>,
    payload: Result<Json<ChangeStatusRequest>, JsonRejection>,
) -> Result<Json<JobSnapshot>, ApiError> {
    let Json(request) = payload.map_err(|err| ApiError::BadRequest(err.body_text()))?;
    if request.status == JobStatus::Created {
        return Err(ApiError::BadRequest(
            "expecting status 'started' or 'stopped'".into(),
        ));
    }

    let job = service.find_job(&job_id)?;
    match request.status {
        JobStatus::Started => service.coordinator.start(&job).await?,
        _ => service.coordinator.stop(&job, StopOrigin::Api).await?,
    }
    let snapshot = job.snapshot();
    tracing::info!(job_id = %snapshot.id, status = %snapshot.status, "job status changed");
    Ok(Json(snapshot))
}
