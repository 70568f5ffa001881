//! Workflow dispatch.

use std::sync::Arc;

use photo_core::retry::RetryPolicy;
use photo_temporal::{StartWorkflow, WorkflowEngine};

use crate::JobError;

/// Default workflow type started for every image job.
pub const DEFAULT_WORKFLOW_TYPE: &str = "image_processing_workflow";

/// Default task queue the workers poll.
pub const DEFAULT_TASK_QUEUE: &str = "image-tasks";

/// Engine connection established at startup, or its absence.
///
/// Cloned into the dispatcher and the reconciler. A disconnected handle
/// makes both fail fast with [`JobError::EngineUnavailable`].
#[derive(Clone, Default)]
pub struct EngineHandle(Option<Arc<dyn WorkflowEngine>>);

impl EngineHandle {
    pub fn connected(engine: Arc<dyn WorkflowEngine>) -> Self {
        Self(Some(engine))
    }

    pub fn disconnected() -> Self {
        Self(None)
    }

    pub fn is_connected(&self) -> bool {
        self.0.is_some()
    }

    pub fn get(&self) -> Result<&Arc<dyn WorkflowEngine>, JobError> {
        self.0.as_ref().ok_or(JobError::EngineUnavailable)
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EngineHandle")
            .field(&if self.is_connected() { "connected" } else { "disconnected" })
            .finish()
    }
}

/// Starts one durable workflow execution per job.
pub struct WorkflowDispatcher {
    engine: EngineHandle,
    workflow_type: String,
    retry_policy: RetryPolicy,
}

impl WorkflowDispatcher {
    pub fn new(engine: EngineHandle, workflow_type: impl Into<String>) -> Self {
        Self {
            engine,
            workflow_type: workflow_type.into(),
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Start the workflow keyed by `job_id`.
    ///
    /// The engine rejects a second start with the same id, which surfaces
    /// as [`JobError::DispatchFailed`].
    pub async fn dispatch(
        &self,
        job_id: &str,
        task_queue: &str,
        payload: serde_json::Value,
    ) -> Result<(), JobError> {
        let engine = self.engine.get()?;
        let request = StartWorkflow {
            workflow_id: job_id.to_string(),
            workflow_type: self.workflow_type.clone(),
            task_queue: task_queue.to_string(),
            input: payload,
            retry_policy: self.retry_policy.clone(),
        };

        match engine.start_workflow(&request).await {
            Ok(()) => {
                tracing::info!(
                    job_id,
                    workflow_type = %self.workflow_type,
                    task_queue,
                    "Workflow dispatched",
                );
                Ok(())
            }
            Err(source) => {
                tracing::error!(job_id, task_queue, error = %source, "Workflow dispatch failed");
                Err(JobError::DispatchFailed {
                    job_id: job_id.to_string(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use photo_temporal::EngineError;

    use super::*;
    use crate::testing::FakeEngine;

    #[tokio::test]
    async fn disconnected_engine_fails_without_a_call() {
        let dispatcher = WorkflowDispatcher::new(EngineHandle::disconnected(), DEFAULT_WORKFLOW_TYPE);
        let err = dispatcher
            .dispatch("img-1", DEFAULT_TASK_QUEUE, serde_json::json!({}))
            .await
            .unwrap_err();
        assert_matches!(err, JobError::EngineUnavailable);
    }

    #[tokio::test]
    async fn dispatch_passes_type_queue_and_policy() {
        let engine = Arc::new(FakeEngine::new());
        let dispatcher =
            WorkflowDispatcher::new(EngineHandle::connected(engine.clone()), "custom_workflow");

        dispatcher
            .dispatch("img-1", "queue-a", serde_json::json!({ "source": "s3" }))
            .await
            .unwrap();

        let started = engine.started();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].workflow_id, "img-1");
        assert_eq!(started[0].workflow_type, "custom_workflow");
        assert_eq!(started[0].task_queue, "queue-a");
        assert_eq!(started[0].retry_policy, RetryPolicy::default());
    }

    #[tokio::test]
    async fn duplicate_job_id_is_rejected() {
        let engine = Arc::new(FakeEngine::new());
        let dispatcher =
            WorkflowDispatcher::new(EngineHandle::connected(engine.clone()), DEFAULT_WORKFLOW_TYPE);
        let payload = serde_json::json!({});

        dispatcher.dispatch("img-1", DEFAULT_TASK_QUEUE, payload.clone()).await.unwrap();
        let err = dispatcher
            .dispatch("img-1", DEFAULT_TASK_QUEUE, payload)
            .await
            .unwrap_err();

        assert_matches!(
            err,
            JobError::DispatchFailed { ref job_id, source: EngineError::AlreadyStarted(_) }
                if job_id == "img-1"
        );
        assert_eq!(engine.started().len(), 1);
    }
}
