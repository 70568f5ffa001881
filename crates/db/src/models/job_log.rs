//! Job ledger models and DTOs.

use photo_core::job::JobType;
use photo_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

use super::status::{JobStatus, StatusId};

/// A row from the `job_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobLog {
    pub id: i64,
    pub job_id: String,
    pub job_type: String,
    pub filename: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_key: Option<String>,
    pub source_url: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<i64>,
    /// Client metadata as an opaque JSON string.
    pub job_metadata: Option<String>,
    pub workflow_id: String,
    pub workflow_task_queue: String,
    pub status_id: StatusId,
    pub result: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

impl JobLog {
    /// Typed status. Ids outside the seed range read as `Unknown`.
    pub fn status(&self) -> JobStatus {
        JobStatus::from_id(self.status_id).unwrap_or(JobStatus::Unknown)
    }
}

/// Insert DTO for a newly admitted job.
#[derive(Debug, Clone)]
pub struct NewJobLog {
    pub job_id: String,
    pub job_type: JobType,
    pub filename: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_key: Option<String>,
    pub source_url: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<i64>,
    pub job_metadata: Option<String>,
    pub workflow_task_queue: String,
    pub status: JobStatus,
    pub started_at: Option<Timestamp>,
}

/// Partial update applied by the orchestrator and the reconciler.
///
/// `None` fields leave the stored value untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct JobLogUpdate {
    pub status: JobStatus,
    pub result: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub completed_at: Option<Timestamp>,
}

impl JobLogUpdate {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status,
            result: None,
            error_message: None,
            completed_at: None,
        }
    }

    pub fn with_result(mut self, result: serde_json::Value) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn completed_at(mut self, at: Timestamp) -> Self {
        self.completed_at = Some(at);
        self
    }
}

/// Resolved filter for listing ledger rows (newest first).
#[derive(Debug, Clone, Default)]
pub struct JobLogFilter {
    pub status: Option<JobStatus>,
    pub job_type: Option<JobType>,
    /// Defaults to 10, clamped to `1..=100`.
    pub limit: Option<i64>,
    /// Defaults to 0.
    pub offset: Option<i64>,
}
