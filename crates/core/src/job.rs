//! Job identity and source types.
//!
//! A job id doubles as the workflow execution id in the engine, so its
//! format is fixed here: `img-` followed by a random v4 UUID.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Prefix of every generated job id.
pub const JOB_ID_PREFIX: &str = "img-";

/// Generate a fresh, globally unique job id.
pub fn generate_job_id() -> String {
    format!("{JOB_ID_PREFIX}{}", uuid::Uuid::new_v4())
}

/// Check that `job_id` has the shape produced by [`generate_job_id`].
pub fn is_valid_job_id(job_id: &str) -> bool {
    job_id
        .strip_prefix(JOB_ID_PREFIX)
        .is_some_and(|rest| uuid::Uuid::parse_str(rest).is_ok())
}

/// Where a job's input image comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    /// Object already uploaded to the raw bucket.
    Upload,
    /// Remote URL fetched by the workflow. Not accepted yet.
    Url,
}

impl JobType {
    /// Database/wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Url => "url",
        }
    }

    /// Parse from the database `job_type` column.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "upload" => Ok(Self::Upload),
            "url" => Ok(Self::Url),
            other => Err(CoreError::Validation(format!(
                "Unknown job type '{other}'. Must be one of: upload, url"
            ))),
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive a display filename from an object key (its last path segment).
///
/// Returns `None` for keys that end in `/` or are empty.
pub fn filename_from_key(key: &str) -> Option<&str> {
    key.rsplit('/').next().filter(|name| !name.is_empty())
}

/// Validate a client-supplied object key.
pub fn validate_object_key(key: &str) -> Result<(), CoreError> {
    if key.trim().is_empty() {
        return Err(CoreError::Validation("Object key must not be empty".into()));
    }
    if key.len() > 1024 {
        return Err(CoreError::Validation(
            "Object key must be at most 1024 bytes".into(),
        ));
    }
    Ok(())
}
