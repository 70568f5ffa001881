//! Status reconciliation between the ledger and the workflow engine.
//!
//! A status query always asks the engine for the live state and folds any
//! transition back into the ledger. The ledger only gates existence: a job
//! it has never seen is reported as not found whatever the engine says.
//! Once the ledger holds `completed` or `failed` that status is final; a
//! disagreeing engine is logged and reported as the ledger has it.
//!
//! | engine status                         | job status |
//! |---------------------------------------|------------|
//! | running, continued-as-new             | running    |
//! | completed                             | completed  |
//! | failed, canceled, terminated, timed-out | failed   |
//! | unspecified / unrecognized            | unknown    |

use std::sync::Arc;

use chrono::Utc;
use photo_db::models::job_log::{JobLog, JobLogUpdate};
use photo_db::models::status::JobStatus;
use photo_temporal::{EngineError, ExecutionStatus, WorkflowEngine};
use serde::Serialize;

use crate::dispatcher::EngineHandle;
use crate::ledger::JobLedger;
use crate::JobError;

/// Map the engine's execution status onto the ledger vocabulary.
pub fn map_execution_status(status: ExecutionStatus) -> JobStatus {
    match status {
        ExecutionStatus::Running | ExecutionStatus::ContinuedAsNew => JobStatus::Running,
        ExecutionStatus::Completed => JobStatus::Completed,
        ExecutionStatus::Failed
        | ExecutionStatus::Canceled
        | ExecutionStatus::Terminated
        | ExecutionStatus::TimedOut => JobStatus::Failed,
        ExecutionStatus::Unspecified => JobStatus::Unknown,
    }
}

/// Status view returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledJob {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl ReconciledJob {
    fn new(job_id: &str, status: JobStatus, result: Option<serde_json::Value>) -> Self {
        Self {
            job_id: job_id.to_string(),
            status,
            result,
        }
    }
}

pub struct StatusReconciler {
    ledger: Arc<dyn JobLedger>,
    engine: EngineHandle,
}

impl StatusReconciler {
    pub fn new(ledger: Arc<dyn JobLedger>, engine: EngineHandle) -> Self {
        Self { ledger, engine }
    }

    /// Query the engine for `job_id` and reconcile the ledger.
    pub async fn reconcile(&self, job_id: &str) -> Result<ReconciledJob, JobError> {
        let Some(record) = self.ledger.get(job_id).await else {
            return Err(JobError::JobNotFound(job_id.to_string()));
        };
        let engine = self.engine.get()?;
        let cached = record.status();

        let live = match engine.describe(job_id).await {
            Ok(status) => status,
            Err(e) if e.is_not_found() => {
                self.mark_unknown(&record, format!("workflow execution not found: {e}"))
                    .await;
                return Err(JobError::JobNotFound(job_id.to_string()));
            }
            Err(source) => {
                tracing::warn!(job_id, error = %source, "Workflow status query failed");
                return Err(JobError::EngineQueryFailed {
                    job_id: job_id.to_string(),
                    source,
                });
            }
        };

        let status = map_execution_status(live);
        if cached.is_terminal() && status != cached {
            tracing::warn!(
                job_id,
                ledger_status = cached.name(),
                engine_status = %live,
                "Engine disagrees with a terminal ledger status",
            );
            return Ok(ReconciledJob::new(job_id, cached, record.result.clone()));
        }

        match status {
            JobStatus::Completed => Ok(self.reconcile_completed(engine.as_ref(), &record).await),
            JobStatus::Failed => {
                if cached != JobStatus::Failed {
                    let message = failure_detail(engine.as_ref(), job_id, live).await;
                    let update = JobLogUpdate::status(JobStatus::Failed)
                        .with_error(message)
                        .completed_at(Utc::now());
                    self.ledger.update(job_id, &update).await;
                }
                Ok(ReconciledJob::new(job_id, JobStatus::Failed, None))
            }
            JobStatus::Unknown => {
                self.mark_unknown(&record, format!("unrecognized workflow status '{live}'"))
                    .await;
                Err(JobError::JobNotFound(job_id.to_string()))
            }
            status => {
                if cached != status {
                    self.ledger
                        .update(job_id, &JobLogUpdate::status(status))
                        .await;
                }
                Ok(ReconciledJob::new(job_id, status, None))
            }
        }
    }

    async fn reconcile_completed(
        &self,
        engine: &dyn WorkflowEngine,
        record: &JobLog,
    ) -> ReconciledJob {
        let job_id = record.job_id.as_str();
        if record.status() == JobStatus::Completed {
            return ReconciledJob::new(job_id, JobStatus::Completed, record.result.clone());
        }

        match engine.result(job_id).await {
            Ok(result) => {
                let update = JobLogUpdate::status(JobStatus::Completed)
                    .with_result(result.clone())
                    .completed_at(Utc::now());
                self.ledger.update(job_id, &update).await;
                ReconciledJob::new(job_id, JobStatus::Completed, Some(result))
            }
            Err(e) => {
                // Ledger stays as is so the next query retries the fetch.
                tracing::warn!(job_id, error = %e, "Failed to fetch workflow result");
                ReconciledJob::new(job_id, JobStatus::Completed, None)
            }
        }
    }

    /// Downgrade a non-terminal row to `unknown`.
    async fn mark_unknown(&self, record: &JobLog, message: String) {
        if record.status().is_terminal() {
            return;
        }
        tracing::warn!(job_id = %record.job_id, reason = %message, "Marking job status unknown");
        let update = JobLogUpdate::status(JobStatus::Unknown).with_error(message);
        self.ledger.update(&record.job_id, &update).await;
    }
}

/// Failure message for a closed, unsuccessful execution. Never empty.
async fn failure_detail(
    engine: &dyn WorkflowEngine,
    job_id: &str,
    live: ExecutionStatus,
) -> String {
    match engine.result(job_id).await {
        Err(EngineError::WorkflowFailed { message, .. }) if !message.is_empty() => message,
        Err(EngineError::WorkflowFailed { .. }) | Ok(_) => format!("workflow {live}"),
        Err(e) => format!("workflow {live}; failure detail unavailable: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::testing::{DescribeOutcome, FakeEngine, MemoryLedger, ResultOutcome};

    struct Harness {
        ledger: Arc<MemoryLedger>,
        engine: Arc<FakeEngine>,
        reconciler: StatusReconciler,
    }

    fn harness() -> Harness {
        let ledger = Arc::new(MemoryLedger::new());
        let engine = Arc::new(FakeEngine::new());
        let reconciler =
            StatusReconciler::new(ledger.clone(), EngineHandle::connected(engine.clone()));
        Harness {
            ledger,
            engine,
            reconciler,
        }
    }

    // ---------------------------------------------------------------------------
    // Status mapping
    // ---------------------------------------------------------------------------

    #[test]
    fn mapping_is_total() {
        assert_eq!(map_execution_status(ExecutionStatus::Running), JobStatus::Running);
        assert_eq!(map_execution_status(ExecutionStatus::ContinuedAsNew), JobStatus::Running);
        assert_eq!(map_execution_status(ExecutionStatus::Completed), JobStatus::Completed);
        assert_eq!(map_execution_status(ExecutionStatus::Failed), JobStatus::Failed);
        assert_eq!(map_execution_status(ExecutionStatus::Canceled), JobStatus::Failed);
        assert_eq!(map_execution_status(ExecutionStatus::Terminated), JobStatus::Failed);
        assert_eq!(map_execution_status(ExecutionStatus::TimedOut), JobStatus::Failed);
        assert_eq!(map_execution_status(ExecutionStatus::Unspecified), JobStatus::Unknown);
    }

    // ---------------------------------------------------------------------------
    // Existence gating
    // ---------------------------------------------------------------------------

    #[tokio::test]
    async fn job_absent_from_ledger_is_not_found_regardless_of_engine() {
        let h = harness();
        h.engine.set_status("img-ghost", DescribeOutcome::Status(ExecutionStatus::Running));

        let err = h.reconciler.reconcile("img-ghost").await.unwrap_err();
        assert_matches!(err, JobError::JobNotFound(ref id) if id == "img-ghost");
        assert_eq!(h.engine.describe_calls(), 0);
    }

    #[tokio::test]
    async fn disconnected_engine_is_unavailable() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.insert("img-1", JobStatus::Started);
        let reconciler = StatusReconciler::new(ledger.clone(), EngineHandle::disconnected());

        let err = reconciler.reconcile("img-1").await.unwrap_err();
        assert_matches!(err, JobError::EngineUnavailable);
        assert_eq!(ledger.status_of("img-1"), Some(JobStatus::Started));
    }

    // ---------------------------------------------------------------------------
    // Transitions
    // ---------------------------------------------------------------------------

    #[tokio::test]
    async fn running_execution_updates_started_row() {
        let h = harness();
        h.ledger.insert("img-1", JobStatus::Started);
        h.engine.set_status("img-1", DescribeOutcome::Status(ExecutionStatus::Running));

        let job = h.reconciler.reconcile("img-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(h.ledger.status_of("img-1"), Some(JobStatus::Running));
    }

    #[tokio::test]
    async fn unchanged_status_skips_the_ledger_write() {
        let h = harness();
        h.ledger.insert("img-1", JobStatus::Running);
        h.engine.set_status("img-1", DescribeOutcome::Status(ExecutionStatus::ContinuedAsNew));

        let job = h.reconciler.reconcile("img-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(h.ledger.update_calls(), 0);
    }

    #[tokio::test]
    async fn completed_execution_caches_result() {
        let h = harness();
        h.ledger.insert("img-1", JobStatus::Running);
        h.engine.set_status("img-1", DescribeOutcome::Status(ExecutionStatus::Completed));
        h.engine.set_result(
            "img-1",
            ResultOutcome::Value(serde_json::json!({ "thumbnail": "t.jpg" })),
        );

        let job = h.reconciler.reconcile("img-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.result, Some(serde_json::json!({ "thumbnail": "t.jpg" })));

        let row = h.ledger.snapshot("img-1").unwrap();
        assert_eq!(row.status(), JobStatus::Completed);
        assert!(row.completed_at.is_some());
        assert_eq!(row.result, Some(serde_json::json!({ "thumbnail": "t.jpg" })));
    }

    #[tokio::test]
    async fn already_completed_job_does_not_refetch_result() {
        let h = harness();
        h.ledger.insert("img-1", JobStatus::Running);
        h.engine.set_status("img-1", DescribeOutcome::Status(ExecutionStatus::Completed));
        h.engine.set_result("img-1", ResultOutcome::Value(serde_json::json!({ "ok": true })));

        h.reconciler.reconcile("img-1").await.unwrap();
        assert_eq!(h.engine.result_calls(), 1);

        let again = h.reconciler.reconcile("img-1").await.unwrap();
        assert_eq!(again.status, JobStatus::Completed);
        assert_eq!(again.result, Some(serde_json::json!({ "ok": true })));
        assert_eq!(h.engine.result_calls(), 1);
    }

    #[tokio::test]
    async fn result_fetch_failure_leaves_ledger_for_retry() {
        let h = harness();
        h.ledger.insert("img-1", JobStatus::Running);
        h.engine.set_status("img-1", DescribeOutcome::Status(ExecutionStatus::Completed));
        h.engine.set_result("img-1", ResultOutcome::Unreachable);

        let job = h.reconciler.reconcile("img-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.result.is_none());
        assert_eq!(h.ledger.status_of("img-1"), Some(JobStatus::Running));
    }

    #[tokio::test]
    async fn failed_execution_marks_running_job_failed() {
        let h = harness();
        h.ledger.insert("img-1", JobStatus::Running);
        h.engine.set_status("img-1", DescribeOutcome::Status(ExecutionStatus::Failed));
        h.engine.set_result("img-1", ResultOutcome::Failed("thumbnail step crashed".into()));

        let job = h.reconciler.reconcile("img-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);

        let row = h.ledger.snapshot("img-1").unwrap();
        assert_eq!(row.status(), JobStatus::Failed);
        assert!(row.completed_at.is_some());
        assert_eq!(row.error_message.as_deref(), Some("thumbnail step crashed"));
    }

    #[tokio::test]
    async fn failure_detail_fetch_error_uses_fallback_message() {
        let h = harness();
        h.ledger.insert("img-1", JobStatus::Running);
        h.engine.set_status("img-1", DescribeOutcome::Status(ExecutionStatus::TimedOut));
        h.engine.set_result("img-1", ResultOutcome::Unreachable);

        let job = h.reconciler.reconcile("img-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);

        let row = h.ledger.snapshot("img-1").unwrap();
        assert_eq!(row.status(), JobStatus::Failed);
        let message = row.error_message.unwrap();
        assert!(
            message.starts_with("workflow timed_out; failure detail unavailable: "),
            "got {message}"
        );
    }

    #[tokio::test]
    async fn terminal_rows_are_not_overwritten() {
        let h = harness();
        h.ledger.insert("img-1", JobStatus::Failed);
        h.engine.set_status("img-1", DescribeOutcome::Status(ExecutionStatus::Running));

        let job = h.reconciler.reconcile("img-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(h.ledger.status_of("img-1"), Some(JobStatus::Failed));
        assert_eq!(h.ledger.update_calls(), 0);
    }

    #[tokio::test]
    async fn failed_row_with_completed_execution_never_fetches_result() {
        let h = harness();
        h.ledger.insert("img-1", JobStatus::Failed);
        h.engine.set_status("img-1", DescribeOutcome::Status(ExecutionStatus::Completed));
        h.engine.set_result("img-1", ResultOutcome::Value(serde_json::json!({ "ok": true })));

        for _ in 0..2 {
            let job = h.reconciler.reconcile("img-1").await.unwrap();
            assert_eq!(job.status, JobStatus::Failed);
            assert!(job.result.is_none());
        }
        assert_eq!(h.engine.result_calls(), 0);
        assert_eq!(h.ledger.update_calls(), 0);
        assert_eq!(h.ledger.status_of("img-1"), Some(JobStatus::Failed));
    }

    #[tokio::test]
    async fn completed_row_with_failed_execution_keeps_cached_result() {
        let h = harness();
        h.ledger.insert("img-1", JobStatus::Running);
        h.engine.set_status("img-1", DescribeOutcome::Status(ExecutionStatus::Completed));
        h.engine.set_result("img-1", ResultOutcome::Value(serde_json::json!({ "ok": true })));
        h.reconciler.reconcile("img-1").await.unwrap();

        h.engine.set_status("img-1", DescribeOutcome::Status(ExecutionStatus::Terminated));
        let job = h.reconciler.reconcile("img-1").await.unwrap();

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.result, Some(serde_json::json!({ "ok": true })));
        assert_eq!(h.engine.result_calls(), 1);
    }

    // ---------------------------------------------------------------------------
    // Engine faults
    // ---------------------------------------------------------------------------

    #[tokio::test]
    async fn execution_not_found_marks_unknown() {
        let h = harness();
        h.ledger.insert("img-1", JobStatus::Started);
        h.engine.set_status("img-1", DescribeOutcome::NotFound);

        let err = h.reconciler.reconcile("img-1").await.unwrap_err();
        assert_matches!(err, JobError::JobNotFound(_));

        let row = h.ledger.snapshot("img-1").unwrap();
        assert_eq!(row.status(), JobStatus::Unknown);
        assert!(row.error_message.unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn unrecognized_status_marks_unknown() {
        let h = harness();
        h.ledger.insert("img-1", JobStatus::Running);
        h.engine.set_status("img-1", DescribeOutcome::Status(ExecutionStatus::Unspecified));

        let err = h.reconciler.reconcile("img-1").await.unwrap_err();
        assert_matches!(err, JobError::JobNotFound(_));
        assert_eq!(h.ledger.status_of("img-1"), Some(JobStatus::Unknown));
    }

    #[tokio::test]
    async fn not_found_keeps_terminal_row() {
        let h = harness();
        h.ledger.insert("img-1", JobStatus::Completed);
        h.engine.set_status("img-1", DescribeOutcome::NotFound);

        let err = h.reconciler.reconcile("img-1").await.unwrap_err();
        assert_matches!(err, JobError::JobNotFound(_));
        assert_eq!(h.ledger.status_of("img-1"), Some(JobStatus::Completed));
        assert_eq!(h.ledger.update_calls(), 0);
    }

    #[tokio::test]
    async fn transient_engine_error_leaves_ledger_untouched() {
        let h = harness();
        h.ledger.insert("img-1", JobStatus::Running);
        h.engine.set_status("img-1", DescribeOutcome::Unreachable);

        let err = h.reconciler.reconcile("img-1").await.unwrap_err();
        assert_matches!(err, JobError::EngineQueryFailed { ref job_id, .. } if job_id == "img-1");
        assert_eq!(h.ledger.status_of("img-1"), Some(JobStatus::Running));
        assert_eq!(h.ledger.update_calls(), 0);
    }

    #[tokio::test]
    async fn unknown_job_recovers_when_engine_reappears() {
        let h = harness();
        h.ledger.insert("img-1", JobStatus::Unknown);
        h.engine.set_status("img-1", DescribeOutcome::Status(ExecutionStatus::Running));

        let job = h.reconciler.reconcile("img-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(h.ledger.status_of("img-1"), Some(JobStatus::Running));
    }
}
