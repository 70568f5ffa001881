use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use photo_core::error::CoreError;
use photo_pipeline::{JobError, UploadError};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`JobError`] for submission and
/// status failures, and adds HTTP-specific variants. Implements
/// [`IntoResponse`] to produce consistent `{"error", "code"}` JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `photo_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A job submission or status query failure.
    #[error(transparent)]
    Job(#[from] JobError),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Invalid(core) => AppError::Core(core),
            UploadError::Presign(e) => AppError::InternalError(e.to_string()),
        }
    }
}

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
            },

            // --- Job pipeline errors ---
            AppError::Job(job) => classify_job_error(job),

            // --- HTTP-specific errors ---
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a [`JobError`] into an HTTP status, error code, and message.
///
/// Engine and storage causes are logged, never echoed to the client.
fn classify_job_error(err: &JobError) -> (StatusCode, &'static str, String) {
    match err {
        JobError::ObjectNotAccessible { bucket, key, .. } => (
            StatusCode::BAD_REQUEST,
            "OBJECT_NOT_ACCESSIBLE",
            format!("Object not found or not accessible: s3://{bucket}/{key}"),
        ),
        JobError::EngineUnavailable => {
            tracing::error!("Request needs the workflow engine but it is not connected");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ENGINE_UNAVAILABLE",
                "Workflow engine is unavailable".to_string(),
            )
        }
        JobError::DispatchFailed { .. } => {
            tracing::error!(error = %err.detail(), "Workflow dispatch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DISPATCH_FAILED",
                err.to_string(),
            )
        }
        JobError::JobNotFound(job_id) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("Job {job_id} not found"),
        ),
        JobError::NotImplemented(_) => (
            StatusCode::NOT_IMPLEMENTED,
            "NOT_IMPLEMENTED",
            err.to_string(),
        ),
        JobError::EngineQueryFailed { .. } => {
            tracing::warn!(error = %err.detail(), "Workflow status query failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "ENGINE_QUERY_FAILED",
                err.to_string(),
            )
        }
    }
}
