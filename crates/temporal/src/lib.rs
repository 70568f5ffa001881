//! Workflow engine client for durable job execution.
//!
//! [`WorkflowEngine`] is the seam the job pipeline depends on.
//! [`api::TemporalApi`] implements it against the Temporal HTTP API
//! (workflow start, describe, and close-event history).

use async_trait::async_trait;
use photo_core::retry::RetryPolicy;

pub mod api;
pub mod error;
pub mod messages;
pub mod status;

pub use error::EngineError;
pub use status::ExecutionStatus;

/// Everything needed to start one workflow execution.
#[derive(Debug, Clone)]
pub struct StartWorkflow {
    /// Execution id; the job id.
    pub workflow_id: String,
    pub workflow_type: String,
    pub task_queue: String,
    pub input: serde_json::Value,
    pub retry_policy: RetryPolicy,
}

/// Durable workflow operations used by dispatch and reconciliation.
#[async_trait]
pub trait WorkflowEngine: Send + Sync {
    /// Start an execution. Fails with [`EngineError::AlreadyStarted`] if
    /// the id was used before.
    async fn start_workflow(&self, request: &StartWorkflow) -> Result<(), EngineError>;

    /// Current status of the latest run for `workflow_id`.
    async fn describe(&self, workflow_id: &str) -> Result<ExecutionStatus, EngineError>;

    /// Result payload of a closed execution.
    ///
    /// Executions that closed unsuccessfully yield
    /// [`EngineError::WorkflowFailed`] carrying the failure detail.
    async fn result(&self, workflow_id: &str) -> Result<serde_json::Value, EngineError>;
}
