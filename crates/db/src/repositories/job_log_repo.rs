//! Repository for the `job_logs` table.
//!
//! Status transitions never leave a terminal state: every update is
//! guarded by `status_id NOT IN (completed, failed)`.

use sqlx::PgPool;

use crate::models::job_log::{JobLog, JobLogFilter, JobLogUpdate, NewJobLog};
use crate::models::status::TERMINAL_STATUSES;

/// Column list for `job_logs` queries.
const COLUMNS: &str = "\
    id, job_id, job_type, filename, s3_bucket, s3_key, source_url, \
    content_type, content_length, job_metadata, \
    workflow_id, workflow_task_queue, status_id, result, error_message, \
    created_at, started_at, completed_at, updated_at";

/// Maximum page size for job listing.
pub const MAX_LIMIT: i64 = 100;

/// Default page size for job listing.
pub const DEFAULT_LIMIT: i64 = 10;

/// Resolve optional paging parameters to `(limit, offset)`.
pub fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

/// Provides insert, lookup, status update and listing for ledger rows.
pub struct JobLogRepo;

impl JobLogRepo {
    /// Insert a new ledger row. The workflow id is the job id.
    pub async fn create(pool: &PgPool, input: &NewJobLog) -> Result<JobLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO job_logs \
                (job_id, job_type, filename, s3_bucket, s3_key, source_url, \
                 content_type, content_length, job_metadata, \
                 workflow_id, workflow_task_queue, status_id, started_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $1, $10, $11, $12) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobLog>(&query)
            .bind(&input.job_id)
            .bind(input.job_type.as_str())
            .bind(&input.filename)
            .bind(&input.s3_bucket)
            .bind(&input.s3_key)
            .bind(&input.source_url)
            .bind(&input.content_type)
            .bind(input.content_length)
            .bind(&input.job_metadata)
            .bind(&input.workflow_task_queue)
            .bind(input.status.id())
            .bind(input.started_at)
            .fetch_one(pool)
            .await
    }

    /// Find a ledger row by its job id.
    pub async fn find_by_job_id(
        pool: &PgPool,
        job_id: &str,
    ) -> Result<Option<JobLog>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM job_logs WHERE job_id = $1");
        sqlx::query_as::<_, JobLog>(&query)
            .bind(job_id)
            .fetch_optional(pool)
            .await
    }

    /// Apply a partial update.
    ///
    /// Returns `false` when the row is missing or already terminal.
    pub async fn update(
        pool: &PgPool,
        job_id: &str,
        update: &JobLogUpdate,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE job_logs \
             SET status_id = $2, \
                 result = COALESCE($3, result), \
                 error_message = COALESCE($4, error_message), \
                 completed_at = COALESCE($5, completed_at) \
             WHERE job_id = $1 AND status_id NOT IN ($6, $7)",
        )
        .bind(job_id)
        .bind(update.status.id())
        .bind(&update.result)
        .bind(&update.error_message)
        .bind(update.completed_at)
        .bind(TERMINAL_STATUSES[0])
        .bind(TERMINAL_STATUSES[1])
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List rows newest first, optionally filtered by status and type.
    pub async fn list(pool: &PgPool, filter: &JobLogFilter) -> Result<Vec<JobLog>, sqlx::Error> {
        let (limit, offset) = page_bounds(filter.limit, filter.offset);
        let query = format!(
            "SELECT {COLUMNS} FROM job_logs \
             WHERE ($1::SMALLINT IS NULL OR status_id = $1) \
               AND ($2::TEXT IS NULL OR job_type = $2) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, JobLog>(&query)
            .bind(filter.status.map(|s| s.id()))
            .bind(filter.job_type.map(|t| t.as_str()))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count rows matching the filter's status and type (paging ignored).
    pub async fn count(pool: &PgPool, filter: &JobLogFilter) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM job_logs \
             WHERE ($1::SMALLINT IS NULL OR status_id = $1) \
               AND ($2::TEXT IS NULL OR job_type = $2)",
        )
        .bind(filter.status.map(|s| s.id()))
        .bind(filter.job_type.map(|t| t.as_str()))
        .fetch_one(pool)
        .await
    }
}
