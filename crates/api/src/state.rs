use std::sync::Arc;

use photo_core::api_key::ApiKeyDigest;
use photo_pipeline::submission::JobService;
use photo_pipeline::uploads::UploadService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind `Arc` or `Copy`. Nothing in here
/// changes after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Job submission and status reconciliation.
    pub jobs: Arc<JobService>,
    /// Presigned upload issuance.
    pub uploads: Arc<UploadService>,
    /// Digest of the configured bearer key.
    pub api_key: ApiKeyDigest,
}
