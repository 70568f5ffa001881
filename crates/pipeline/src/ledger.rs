//! Best-effort job ledger.
//!
//! The ledger is a cache of last-known job status; truth lives in the
//! workflow engine. No ledger failure ever reaches a caller: writes are
//! logged and dropped, reads degrade to "absent".

use async_trait::async_trait;
use photo_db::models::job_log::{JobLog, JobLogFilter, JobLogUpdate, NewJobLog};
use photo_db::repositories::job_log_repo::page_bounds;
use photo_db::repositories::JobLogRepo;
use photo_db::DbPool;
use serde::Serialize;

/// Outcome of [`JobLedger::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tracking {
    /// The row was persisted.
    Tracked,
    /// The ledger is unavailable or the insert failed.
    Untracked,
}

/// One page of ledger rows plus the unpaged total.
#[derive(Debug, Clone, Serialize)]
pub struct JobPage {
    pub jobs: Vec<JobLog>,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
}

impl JobPage {
    /// An empty page echoing the resolved paging bounds.
    pub fn empty(filter: &JobLogFilter) -> Self {
        let (limit, offset) = page_bounds(filter.limit, filter.offset);
        Self {
            jobs: Vec::new(),
            total: 0,
            offset,
            limit,
        }
    }
}

/// Persistent record of submitted jobs. Every operation is infallible from
/// the caller's point of view.
#[async_trait]
pub trait JobLedger: Send + Sync {
    async fn record(&self, job: &NewJobLog) -> Tracking;

    /// Apply a partial update. Missing or terminal rows are left alone.
    async fn update(&self, job_id: &str, update: &JobLogUpdate);

    async fn get(&self, job_id: &str) -> Option<JobLog>;

    /// Newest-first page for the admin listing.
    async fn list(&self, filter: &JobLogFilter) -> JobPage;

    fn is_available(&self) -> bool;
}

/// Ledger backed by the `job_logs` table.
pub struct PgLedger {
    pool: DbPool,
}

impl PgLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobLedger for PgLedger {
    async fn record(&self, job: &NewJobLog) -> Tracking {
        match JobLogRepo::create(&self.pool, job).await {
            Ok(row) => {
                tracing::debug!(job_id = %row.job_id, id = row.id, "Job recorded in ledger");
                Tracking::Tracked
            }
            Err(e) => {
                tracing::warn!(job_id = %job.job_id, error = %e, "Failed to record job in ledger");
                Tracking::Untracked
            }
        }
    }

    async fn update(&self, job_id: &str, update: &JobLogUpdate) {
        match JobLogRepo::update(&self.pool, job_id, update).await {
            Ok(true) => {
                tracing::debug!(job_id, status = %update.status, "Ledger status updated");
            }
            Ok(false) => {
                tracing::debug!(
                    job_id,
                    status = %update.status,
                    "Ledger row missing or terminal, update skipped",
                );
            }
            Err(e) => {
                tracing::warn!(job_id, status = %update.status, error = %e, "Failed to update ledger");
            }
        }
    }

    async fn get(&self, job_id: &str) -> Option<JobLog> {
        JobLogRepo::find_by_job_id(&self.pool, job_id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(job_id, error = %e, "Failed to read job from ledger");
                None
            })
    }

    async fn list(&self, filter: &JobLogFilter) -> JobPage {
        let (limit, offset) = page_bounds(filter.limit, filter.offset);
        let rows = JobLogRepo::list(&self.pool, filter).await;
        let total = JobLogRepo::count(&self.pool, filter).await;
        match (rows, total) {
            (Ok(jobs), Ok(total)) => JobPage {
                jobs,
                total,
                offset,
                limit,
            },
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "Failed to list jobs from ledger");
                JobPage::empty(filter)
            }
        }
    }

    fn is_available(&self) -> bool {
        !self.pool.is_closed()
    }
}

/// Ledger used when no database is configured or reachable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLedger;

#[async_trait]
impl JobLedger for NullLedger {
    async fn record(&self, job: &NewJobLog) -> Tracking {
        tracing::debug!(job_id = %job.job_id, "Ledger unavailable, job not recorded");
        Tracking::Untracked
    }

    async fn update(&self, job_id: &str, update: &JobLogUpdate) {
        tracing::debug!(job_id, status = %update.status, "Ledger unavailable, update dropped");
    }

    async fn get(&self, _job_id: &str) -> Option<JobLog> {
        None
    }

    async fn list(&self, filter: &JobLogFilter) -> JobPage {
        JobPage::empty(filter)
    }

    fn is_available(&self) -> bool {
        false
    }
}
