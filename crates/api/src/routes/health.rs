use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Process liveness; always `true` when the server answers.
    pub ok: bool,
    /// `ok`, or `degraded` when the ledger or engine is missing.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub ledger_available: bool,
    pub engine_connected: bool,
}

/// GET /healthz -- liveness plus dependency availability. Always 200.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ledger_available = state.jobs.ledger().is_available();
    let engine_connected = state.jobs.engine_connected();

    let status = if ledger_available && engine_connected {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        ok: true,
        status,
        version: env!("CARGO_PKG_VERSION"),
        ledger_available,
        engine_connected,
    })
}

/// Mount health check routes (unauthenticated).
pub fn router() -> Router<AppState> {
    Router::new().route("/healthz", get(health_check))
}
