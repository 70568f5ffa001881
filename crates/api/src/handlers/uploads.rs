//! Handlers for the `/uploads` resource.

use axum::extract::State;
use axum::Json;
use photo_pipeline::uploads::{InitUpload, UploadForm};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::ApiKeyAuth;
use crate::state::AppState;

/// Body of `POST /uploads/init`.
#[derive(Debug, Deserialize)]
pub struct InitUploadRequest {
    pub content_type: String,
    #[serde(default)]
    pub max_bytes: Option<u64>,
    #[serde(default)]
    pub key_prefix: Option<String>,
}

/// POST /uploads/init
///
/// Issue a presigned POST form for a direct upload to the raw bucket.
pub async fn init_upload(
    _auth: ApiKeyAuth,
    State(state): State<AppState>,
    Json(input): Json<InitUploadRequest>,
) -> AppResult<Json<UploadForm>> {
    let form = state
        .uploads
        .init_upload(InitUpload {
            content_type: input.content_type,
            max_bytes: input.max_bytes,
            key_prefix: input.key_prefix,
        })
        .await?;
    Ok(Json(form))
}
