//! Route definitions for the `/jobs` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// POST   /from-upload     -> submit_from_upload
/// POST   /from-url        -> submit_from_url
/// GET    /{job_id}        -> get_job
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/from-upload", post(jobs::submit_from_upload))
        .route("/from-url", post(jobs::submit_from_url))
        .route("/{job_id}", get(jobs::get_job))
}
