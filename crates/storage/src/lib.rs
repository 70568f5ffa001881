//! Object storage access for the photo gateway.
//!
//! [`ObjectStorage`] is the seam the job pipeline depends on; [`s3::S3Storage`]
//! implements it on top of `aws-sdk-s3`. Presigned POST forms are built by
//! [`presign`], which signs S3 POST policies with SigV4.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

pub mod error;
pub mod presign;
pub mod s3;

pub use error::StorageError;

/// Metadata returned by a successful existence probe.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectHead {
    /// Content type recorded by the storage system.
    pub content_type: Option<String>,
    /// Object size in bytes.
    pub size: Option<i64>,
}

/// One entry of an S3 POST policy `conditions` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostCondition {
    /// `{"<field>": "<value>"}`
    Equals { field: String, value: String },
    /// `["content-length-range", min, max]`
    ContentLengthRange { min: u64, max: u64 },
}

impl PostCondition {
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Render the condition as it appears in the policy document.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Equals { field, value } => {
                let mut entry = serde_json::Map::new();
                entry.insert(field.clone(), serde_json::Value::String(value.clone()));
                serde_json::Value::Object(entry)
            }
            Self::ContentLengthRange { min, max } => {
                serde_json::json!(["content-length-range", min, max])
            }
        }
    }
}

/// Input for [`ObjectStorage::presign_post`].
#[derive(Debug, Clone)]
pub struct PresignPostRequest {
    pub bucket: String,
    pub key: String,
    /// Form fields the client must send verbatim.
    pub fields: BTreeMap<String, String>,
    pub conditions: Vec<PostCondition>,
    pub expires_in: Duration,
}

/// A browser-postable upload form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresignedPost {
    pub url: String,
    pub fields: BTreeMap<String, String>,
}

/// Object storage operations used by job admission and upload issuance.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Metadata-only existence probe. Never retries.
    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectHead, StorageError>;

    /// Build a presigned POST form for a direct upload.
    async fn presign_post(
        &self,
        request: &PresignPostRequest,
    ) -> Result<PresignedPost, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditions_render_in_policy_shape() {
        assert_eq!(
            PostCondition::equals("content-type", "image/jpeg").to_json(),
            serde_json::json!({ "content-type": "image/jpeg" })
        );
        assert_eq!(
            PostCondition::ContentLengthRange { min: 1, max: 25_000_000 }.to_json(),
            serde_json::json!(["content-length-range", 1, 25_000_000])
        );
    }
}
