//! Handlers for the `/admin` resource.

use axum::extract::{Query, State};
use axum::Json;
use photo_core::error::CoreError;
use photo_core::job::JobType;
use photo_core::types::Timestamp;
use photo_db::models::job_log::{JobLog, JobLogFilter};
use photo_db::models::status::JobStatus;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::ApiKeyAuth;
use crate::state::AppState;

/// Query parameters for `GET /admin/jobs`.
#[derive(Debug, Default, Deserialize)]
pub struct AdminJobsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Status name, e.g. `running`.
    pub status: Option<String>,
    /// `upload` or `url`.
    pub job_type: Option<String>,
}

/// Ledger row as exposed to operators.
#[derive(Debug, Serialize)]
pub struct JobSummary {
    pub job_id: String,
    pub job_type: String,
    pub status: JobStatus,
    pub filename: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_key: Option<String>,
    pub source_url: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<i64>,
    pub job_metadata: Option<String>,
    pub workflow_id: String,
    pub workflow_task_queue: String,
    pub result: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

impl From<JobLog> for JobSummary {
    fn from(row: JobLog) -> Self {
        Self {
            status: row.status(),
            job_id: row.job_id,
            job_type: row.job_type,
            filename: row.filename,
            s3_bucket: row.s3_bucket,
            s3_key: row.s3_key,
            source_url: row.source_url,
            content_type: row.content_type,
            content_length: row.content_length,
            job_metadata: row.job_metadata,
            workflow_id: row.workflow_id,
            workflow_task_queue: row.workflow_task_queue,
            result: row.result,
            error_message: row.error_message,
            created_at: row.created_at,
            started_at: row.started_at,
            completed_at: row.completed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobSummary>,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
}

/// GET /admin/jobs
///
/// Newest-first page of the ledger. Empty when the ledger is unavailable.
pub async fn list_jobs(
    _auth: ApiKeyAuth,
    State(state): State<AppState>,
    Query(params): Query<AdminJobsQuery>,
) -> AppResult<Json<JobListResponse>> {
    let filter = JobLogFilter {
        status: params.status.as_deref().map(parse_status).transpose()?,
        job_type: params
            .job_type
            .as_deref()
            .map(JobType::from_name)
            .transpose()?,
        limit: params.limit,
        offset: params.offset,
    };

    let page = state.jobs.ledger().list(&filter).await;
    Ok(Json(JobListResponse {
        jobs: page.jobs.into_iter().map(JobSummary::from).collect(),
        total: page.total,
        offset: page.offset,
        limit: page.limit,
    }))
}

fn parse_status(name: &str) -> Result<JobStatus, AppError> {
    JobStatus::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = JobStatus::ALL.iter().map(|s| s.name()).collect();
        AppError::Core(CoreError::Validation(format!(
            "Unknown status '{name}'. Must be one of: {}",
            known.join(", ")
        )))
    })
}
