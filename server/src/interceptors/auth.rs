use crate::error::ApiError;
use crate::services::jobservice::{authz::Permission, JobService};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, Method},
    middleware::Next,
    response::Response,
};

/// An axum middleware function.
///
/// Takes the user name from the `Authorization` header and checks it has the permission the
/// request's method calls for. Reads need `Query`, everything else needs `StartOrStop`.
pub async fn verify_auth(
    State(service): State<JobService>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // the header is just the user name, a stand-in for a real auth scheme
    let user_id = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|user| !user.is_empty())
        .ok_or_else(|| ApiError::Unauthenticated("no Authorization header found".into()))?
        .to_string();

    let permission = required_permission(req.method());
    let authz_db = service.authz_db();
    if !authz_db.knows(&user_id) {
        return Err(ApiError::Unauthenticated(format!(
            "user {} not found",
            user_id
        )));
    }
    if !authz_db.has_permission(&user_id, permission) {
        return Err(ApiError::Forbidden(format!(
            "user {} lacks {:?} permission",
            user_id, permission
        )));
    }

    tracing::debug!(user = %user_id, ?permission, "request authorized");
    Ok(next.run(req).await)
}

fn required_permission(method: &Method) -> Permission {
    if *method == Method::GET || *method == Method::HEAD {
        Permission::Query
    } else {
        Permission::StartOrStop
    }
}
