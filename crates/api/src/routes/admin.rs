use axum::routing::get;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET    /jobs            -> list_jobs (?limit, offset, status, job_type)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/jobs", get(admin::list_jobs))
}
