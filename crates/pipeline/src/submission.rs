//! Job submission orchestration.
//!
//! `from-upload` runs: existence check, ledger insert, workflow dispatch,
//! ledger status update. Only the existence check and the dispatch can fail
//! the request; ledger writes are best-effort throughout.

use std::sync::Arc;

use chrono::Utc;
use photo_core::job::{filename_from_key, generate_job_id, JobType};
use photo_core::types::JobMetadata;
use photo_db::models::job_log::{JobLogUpdate, NewJobLog};
use photo_db::models::status::JobStatus;
use photo_storage::ObjectStorage;
use serde::Serialize;

use crate::admission::check_object;
use crate::dispatcher::{EngineHandle, WorkflowDispatcher};
use crate::ledger::{JobLedger, Tracking};
use crate::reconciler::{ReconciledJob, StatusReconciler};
use crate::JobError;

/// Dispatch parameters fixed at startup.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub workflow_type: String,
    pub task_queue: String,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            workflow_type: crate::dispatcher::DEFAULT_WORKFLOW_TYPE.to_string(),
            task_queue: crate::dispatcher::DEFAULT_TASK_QUEUE.to_string(),
        }
    }
}

/// Response for an admitted job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmittedJob {
    pub job_id: String,
    pub status: JobStatus,
}

/// Entry point for job submission and status queries.
pub struct JobService {
    storage: Arc<dyn ObjectStorage>,
    ledger: Arc<dyn JobLedger>,
    engine: EngineHandle,
    dispatcher: WorkflowDispatcher,
    reconciler: StatusReconciler,
    task_queue: String,
}

impl JobService {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        ledger: Arc<dyn JobLedger>,
        engine: EngineHandle,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            dispatcher: WorkflowDispatcher::new(engine.clone(), settings.workflow_type),
            reconciler: StatusReconciler::new(ledger.clone(), engine.clone()),
            storage,
            ledger,
            engine,
            task_queue: settings.task_queue,
        }
    }

    pub fn ledger(&self) -> &Arc<dyn JobLedger> {
        &self.ledger
    }

    pub fn engine_connected(&self) -> bool {
        self.engine.is_connected()
    }

    /// Admit a job for an object already uploaded to `bucket`.
    pub async fn submit_from_upload(
        &self,
        bucket: &str,
        key: &str,
        metadata: JobMetadata,
    ) -> Result<SubmittedJob, JobError> {
        let head = check_object(self.storage.as_ref(), bucket, key).await?;
        let job_id = generate_job_id();

        let job_metadata = if metadata.is_empty() {
            None
        } else {
            serde_json::to_string(&metadata).ok()
        };
        let record = NewJobLog {
            job_id: job_id.clone(),
            job_type: JobType::Upload,
            filename: filename_from_key(key).map(str::to_string),
            s3_bucket: Some(bucket.to_string()),
            s3_key: Some(key.to_string()),
            source_url: None,
            content_type: head.content_type.clone(),
            content_length: head.size,
            job_metadata,
            workflow_task_queue: self.task_queue.clone(),
            status: JobStatus::Submitted,
            started_at: Some(Utc::now()),
        };
        let tracking = self.ledger.record(&record).await;

        let payload = serde_json::json!({
            "source": "s3",
            "bucket": bucket,
            "key": key,
            "meta": metadata,
        });
        if let Err(e) = self.dispatcher.dispatch(&job_id, &self.task_queue, payload).await {
            let update = JobLogUpdate::status(JobStatus::Failed).with_error(e.detail());
            self.ledger.update(&job_id, &update).await;
            return Err(e);
        }

        self.ledger
            .update(&job_id, &JobLogUpdate::status(JobStatus::Started))
            .await;

        tracing::info!(
            job_id = %job_id,
            bucket,
            key,
            content_type = head.content_type.as_deref().unwrap_or("unknown"),
            tracked = tracking == Tracking::Tracked,
            "Job submitted from upload",
        );
        Ok(SubmittedJob {
            job_id,
            status: JobStatus::Started,
        })
    }

    /// URL ingestion is not accepted. Touches neither ledger nor engine.
    pub async fn submit_from_url(
        &self,
        url: &str,
        _filename: Option<&str>,
        _metadata: JobMetadata,
    ) -> Result<SubmittedJob, JobError> {
        tracing::info!(url, "Rejected job submission from URL");
        Err(JobError::NotImplemented("Job submission from URL"))
    }

    /// Live status of `job_id`, reconciled into the ledger.
    pub async fn job_status(&self, job_id: &str) -> Result<ReconciledJob, JobError> {
        self.reconciler.reconcile(job_id).await
    }
}
