//! Request handlers, grouped by resource.

pub mod admin;
pub mod jobs;
pub mod uploads;

use std::future::Future;

use photo_pipeline::JobError;

use crate::error::{AppError, AppResult};

/// Run `work` on its own task and await it.
///
/// A client disconnect drops the handler future; the spawned task keeps
/// going so storage, ledger and engine calls are never abandoned halfway.
pub(crate) async fn run_detached<T, F>(work: F) -> AppResult<T>
where
    F: Future<Output = Result<T, JobError>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(work)
        .await
        .map_err(|e| AppError::InternalError(format!("Job task failed: {e}")))?
        .map_err(AppError::from)
}
