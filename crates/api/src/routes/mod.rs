pub mod admin;
pub mod health;
pub mod jobs;
pub mod uploads;

use axum::Router;

use crate::state::AppState;

/// Build the authenticated route tree.
///
/// Route hierarchy:
///
/// ```text
/// /jobs
///     /from-upload                     submit from uploaded object (POST)
///     /from-url                        submit from URL, always 501 (POST)
///     /{job_id}                        reconciled status (GET)
///
/// /uploads
///     /init                            presigned POST form (POST)
///
/// /admin
///     /jobs                            ledger listing (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/jobs", jobs::router())
        .nest("/uploads", uploads::router())
        .nest("/admin", admin::router())
}
