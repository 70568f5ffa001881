//! Presigned direct-to-storage uploads.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use photo_core::upload::{new_object_key, validate_upload_request, PRESIGNED_ORIGIN};
use photo_storage::{ObjectStorage, PostCondition, PresignPostRequest};
use serde::Serialize;

use crate::UploadError;

/// Request to open one upload slot.
#[derive(Debug, Clone, Default)]
pub struct InitUpload {
    pub content_type: String,
    /// Defaults to the configured ceiling.
    pub max_bytes: Option<u64>,
    pub key_prefix: Option<String>,
}

/// Browser-postable form plus the key the object will land under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadForm {
    pub url: String,
    pub fields: BTreeMap<String, String>,
    pub key: String,
}

pub struct UploadService {
    storage: Arc<dyn ObjectStorage>,
    bucket: String,
    max_upload_bytes: u64,
    expires_in: Duration,
}

impl UploadService {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        bucket: impl Into<String>,
        max_upload_bytes: u64,
        expires_in: Duration,
    ) -> Self {
        Self {
            storage,
            bucket: bucket.into(),
            max_upload_bytes,
            expires_in,
        }
    }

    pub async fn init_upload(&self, request: InitUpload) -> Result<UploadForm, UploadError> {
        let max_bytes = request.max_bytes.unwrap_or(self.max_upload_bytes);
        validate_upload_request(&request.content_type, max_bytes, self.max_upload_bytes)?;

        let key = new_object_key(
            request.key_prefix.as_deref(),
            &request.content_type,
            Utc::now(),
        );

        let mut fields = BTreeMap::new();
        fields.insert("Content-Type".to_string(), request.content_type.clone());
        fields.insert("x-amz-meta-origin".to_string(), PRESIGNED_ORIGIN.to_string());

        let presign = PresignPostRequest {
            bucket: self.bucket.clone(),
            key: key.clone(),
            fields,
            conditions: vec![
                PostCondition::equals("Content-Type", &request.content_type),
                PostCondition::ContentLengthRange {
                    min: 1,
                    max: max_bytes,
                },
                PostCondition::equals("x-amz-meta-origin", PRESIGNED_ORIGIN),
            ],
            expires_in: self.expires_in,
        };
        let post = self.storage.presign_post(&presign).await?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            content_type = %request.content_type,
            max_bytes,
            "Upload form issued",
        );
        Ok(UploadForm {
            url: post.url,
            fields: post.fields,
            key,
        })
    }
}
