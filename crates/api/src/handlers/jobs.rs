//! Handlers for the `/jobs` resource.
//!
//! All endpoints require the API key via [`ApiKeyAuth`].

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use photo_core::job::validate_object_key;
use photo_core::types::JobMetadata;
use photo_pipeline::reconciler::ReconciledJob;
use photo_pipeline::submission::SubmittedJob;
use serde::Deserialize;

use crate::error::AppResult;
use crate::handlers::run_detached;
use crate::middleware::auth::ApiKeyAuth;
use crate::state::AppState;

/// Body of `POST /jobs/from-upload`.
#[derive(Debug, Deserialize)]
pub struct FromUploadRequest {
    /// Object key in the raw bucket.
    pub key: String,
    #[serde(default)]
    pub job_metadata: Option<JobMetadata>,
}

/// Body of `POST /jobs/from-url`. Read leniently: a body that does not
/// match this shape is treated as empty.
#[derive(Debug, Default, Deserialize)]
pub struct FromUrlRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub job_metadata: Option<JobMetadata>,
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /jobs/from-upload
///
/// Admit a job for an object already uploaded to the raw bucket and start
/// its workflow. Returns `{job_id, status: "started"}`.
pub async fn submit_from_upload(
    _auth: ApiKeyAuth,
    State(state): State<AppState>,
    Json(input): Json<FromUploadRequest>,
) -> AppResult<Json<SubmittedJob>> {
    validate_object_key(&input.key)?;

    let jobs = Arc::clone(&state.jobs);
    let bucket = state.config.storage.bucket_raw.clone();
    let metadata = input.job_metadata.unwrap_or_default();
    let job = run_detached(async move {
        jobs.submit_from_upload(&bucket, &input.key, metadata).await
    })
    .await?;

    Ok(Json(job))
}

/// POST /jobs/from-url
///
/// URL ingestion is not offered; always 501. The body is taken as raw bytes
/// so no payload, content type or encoding is rejected first.
pub async fn submit_from_url(
    _auth: ApiKeyAuth,
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<SubmittedJob>> {
    let input: FromUrlRequest = serde_json::from_slice(&body).unwrap_or_default();
    let job = state
        .jobs
        .submit_from_url(
            &input.url,
            input.filename.as_deref(),
            input.job_metadata.unwrap_or_default(),
        )
        .await?;
    Ok(Json(job))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// GET /jobs/{job_id}
///
/// Live status from the workflow engine, reconciled into the ledger.
pub async fn get_job(
    _auth: ApiKeyAuth,
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<Json<ReconciledJob>> {
    let jobs = Arc::clone(&state.jobs);
    let job = run_detached(async move { jobs.job_status(&job_id).await }).await?;
    Ok(Json(job))
}
