//! In-memory doubles for the storage, engine and ledger seams.
//!
//! Used by this crate's unit tests and, through the `testing` feature, by
//! the HTTP crate's integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use photo_core::job::JobType;
use photo_db::models::job_log::{JobLog, JobLogFilter, JobLogUpdate, NewJobLog};
use photo_db::models::status::JobStatus;
use photo_db::repositories::job_log_repo::page_bounds;
use photo_storage::{ObjectHead, ObjectStorage, PresignPostRequest, PresignedPost, StorageError};
use photo_temporal::{EngineError, ExecutionStatus, StartWorkflow, WorkflowEngine};

use crate::ledger::{JobLedger, JobPage, Tracking};

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Object storage holding a fixed set of objects.
#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<HashMap<(String, String), ObjectHead>>,
    presigned: Mutex<Vec<PresignPostRequest>>,
    head_calls: AtomicUsize,
}

impl FakeStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, bucket: &str, key: &str, content_type: &str, size: i64) {
        let head = ObjectHead {
            content_type: Some(content_type.to_string()),
            size: Some(size),
        };
        lock(&self.objects).insert((bucket.to_string(), key.to_string()), head);
    }

    pub fn head_calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }

    pub fn last_presign(&self) -> Option<PresignPostRequest> {
        lock(&self.presigned).last().cloned()
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectHead, StorageError> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.objects)
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotAccessible {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: "NotFound".to_string(),
            })
    }

    async fn presign_post(
        &self,
        request: &PresignPostRequest,
    ) -> Result<PresignedPost, StorageError> {
        lock(&self.presigned).push(request.clone());
        let mut fields = request.fields.clone();
        fields.insert("key".to_string(), request.key.clone());
        fields.insert("policy".to_string(), "cG9saWN5".to_string());
        fields.insert("x-amz-signature".to_string(), "0".repeat(64));
        Ok(PresignedPost {
            url: format!("https://{}.s3.test.invalid", request.bucket),
            fields,
        })
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Scripted answer to `describe`.
#[derive(Debug, Clone)]
pub enum DescribeOutcome {
    Status(ExecutionStatus),
    /// The engine has no such execution.
    NotFound,
    /// Transient fault (engine 503).
    Unreachable,
}

/// Scripted answer to `result`.
#[derive(Debug, Clone)]
pub enum ResultOutcome {
    Value(serde_json::Value),
    /// The execution closed unsuccessfully with this message.
    Failed(String),
    Unreachable,
}

/// Workflow engine that records starts and replays scripted outcomes.
///
/// Started executions describe as running until scripted otherwise;
/// anything never started describes as not found.
#[derive(Default)]
pub struct FakeEngine {
    started: Mutex<Vec<StartWorkflow>>,
    seen_ids: Mutex<HashSet<String>>,
    statuses: Mutex<HashMap<String, DescribeOutcome>>,
    results: Mutex<HashMap<String, ResultOutcome>>,
    reject_starts: AtomicBool,
    describe_calls: AtomicUsize,
    result_calls: AtomicUsize,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&self, workflow_id: &str, outcome: DescribeOutcome) {
        lock(&self.statuses).insert(workflow_id.to_string(), outcome);
    }

    pub fn set_result(&self, workflow_id: &str, outcome: ResultOutcome) {
        lock(&self.results).insert(workflow_id.to_string(), outcome);
    }

    /// Make every start request fail with an engine 500.
    pub fn reject_starts(&self, reject: bool) {
        self.reject_starts.store(reject, Ordering::SeqCst);
    }

    /// Successfully started executions, in order.
    pub fn started(&self) -> Vec<StartWorkflow> {
        lock(&self.started).clone()
    }

    pub fn describe_calls(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    pub fn result_calls(&self) -> usize {
        self.result_calls.load(Ordering::SeqCst)
    }
}

fn unreachable_engine() -> EngineError {
    EngineError::ApiError {
        status: 503,
        body: "engine unavailable".to_string(),
    }
}

#[async_trait]
impl WorkflowEngine for FakeEngine {
    async fn start_workflow(&self, request: &StartWorkflow) -> Result<(), EngineError> {
        if self.reject_starts.load(Ordering::SeqCst) {
            return Err(EngineError::ApiError {
                status: 500,
                body: "start rejected".to_string(),
            });
        }
        if !lock(&self.seen_ids).insert(request.workflow_id.clone()) {
            return Err(EngineError::AlreadyStarted(request.workflow_id.clone()));
        }
        lock(&self.started).push(request.clone());
        Ok(())
    }

    async fn describe(&self, workflow_id: &str) -> Result<ExecutionStatus, EngineError> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = lock(&self.statuses).get(workflow_id).cloned();
        match scripted {
            Some(DescribeOutcome::Status(status)) => Ok(status),
            Some(DescribeOutcome::NotFound) => Err(EngineError::NotFound(workflow_id.to_string())),
            Some(DescribeOutcome::Unreachable) => Err(unreachable_engine()),
            None if lock(&self.seen_ids).contains(workflow_id) => Ok(ExecutionStatus::Running),
            None => Err(EngineError::NotFound(workflow_id.to_string())),
        }
    }

    async fn result(&self, workflow_id: &str) -> Result<serde_json::Value, EngineError> {
        self.result_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = lock(&self.results).get(workflow_id).cloned();
        match scripted {
            Some(ResultOutcome::Value(value)) => Ok(value),
            Some(ResultOutcome::Failed(message)) => Err(EngineError::WorkflowFailed {
                status: ExecutionStatus::Failed,
                message,
            }),
            Some(ResultOutcome::Unreachable) => Err(unreachable_engine()),
            None => Err(EngineError::Protocol(format!("{workflow_id} has no close event yet"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Ledger held in memory with the same terminal-state guard as the SQL one.
#[derive(Default)]
pub struct MemoryLedger {
    rows: Mutex<HashMap<String, JobLog>>,
    next_id: AtomicUsize,
    update_calls: AtomicUsize,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an upload row directly in `status`.
    pub fn insert(&self, job_id: &str, status: JobStatus) {
        let now = Utc::now();
        let row = JobLog {
            id: self.next_row_id(),
            job_id: job_id.to_string(),
            job_type: JobType::Upload.as_str().to_string(),
            filename: Some("seed.jpg".to_string()),
            s3_bucket: Some("photos-raw".to_string()),
            s3_key: Some("seed.jpg".to_string()),
            source_url: None,
            content_type: Some("image/jpeg".to_string()),
            content_length: Some(1),
            job_metadata: None,
            workflow_id: job_id.to_string(),
            workflow_task_queue: "image-tasks".to_string(),
            status_id: status.id(),
            result: None,
            error_message: None,
            created_at: now,
            started_at: Some(now),
            completed_at: None,
            updated_at: now,
        };
        lock(&self.rows).insert(job_id.to_string(), row);
    }

    pub fn snapshot(&self, job_id: &str) -> Option<JobLog> {
        lock(&self.rows).get(job_id).cloned()
    }

    pub fn status_of(&self, job_id: &str) -> Option<JobStatus> {
        self.snapshot(job_id).map(|row| row.status())
    }

    pub fn count_with_status(&self, status: JobStatus) -> usize {
        lock(&self.rows)
            .values()
            .filter(|row| row.status() == status)
            .count()
    }

    pub fn len(&self) -> usize {
        lock(&self.rows).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Update attempts, including ones the terminal guard refused.
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    fn next_row_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1
    }
}

#[async_trait]
impl JobLedger for MemoryLedger {
    async fn record(&self, job: &NewJobLog) -> Tracking {
        let now = Utc::now();
        let mut rows = lock(&self.rows);
        if rows.contains_key(&job.job_id) {
            return Tracking::Untracked;
        }
        let row = JobLog {
            id: self.next_row_id(),
            job_id: job.job_id.clone(),
            job_type: job.job_type.as_str().to_string(),
            filename: job.filename.clone(),
            s3_bucket: job.s3_bucket.clone(),
            s3_key: job.s3_key.clone(),
            source_url: job.source_url.clone(),
            content_type: job.content_type.clone(),
            content_length: job.content_length,
            job_metadata: job.job_metadata.clone(),
            workflow_id: job.job_id.clone(),
            workflow_task_queue: job.workflow_task_queue.clone(),
            status_id: job.status.id(),
            result: None,
            error_message: None,
            created_at: now,
            started_at: job.started_at,
            completed_at: None,
            updated_at: now,
        };
        rows.insert(job.job_id.clone(), row);
        Tracking::Tracked
    }

    async fn update(&self, job_id: &str, update: &JobLogUpdate) {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = lock(&self.rows);
        let Some(row) = rows.get_mut(job_id) else {
            return;
        };
        if row.status().is_terminal() {
            return;
        }
        row.status_id = update.status.id();
        if let Some(result) = &update.result {
            row.result = Some(result.clone());
        }
        if let Some(message) = &update.error_message {
            row.error_message = Some(message.clone());
        }
        if let Some(at) = update.completed_at {
            row.completed_at = Some(at);
        }
        row.updated_at = Utc::now();
    }

    async fn get(&self, job_id: &str) -> Option<JobLog> {
        self.snapshot(job_id)
    }

    async fn list(&self, filter: &JobLogFilter) -> JobPage {
        let (limit, offset) = page_bounds(filter.limit, filter.offset);
        let mut matching: Vec<JobLog> = lock(&self.rows)
            .values()
            .filter(|row| filter.status.map_or(true, |s| row.status_id == s.id()))
            .filter(|row| filter.job_type.map_or(true, |t| row.job_type == t.as_str()))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let jobs = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        JobPage {
            jobs,
            total,
            offset,
            limit,
        }
    }

    fn is_available(&self) -> bool {
        true
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
