//! HTTP client for the Temporal frontend's HTTP API.
//!
//! Wraps workflow start, describe and close-event history retrieval
//! using [`reqwest`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};

use crate::messages::{
    first_payload, DescribeWorkflowResponse, HistoryEvent, HistoryResponse, Named,
    RetryPolicyBody, StartWorkflowRequest, StartWorkflowResponse, CLOSE_EVENT_FILTER,
    REUSE_POLICY_REJECT_DUPLICATE,
};
use crate::{EngineError, ExecutionStatus, StartWorkflow, WorkflowEngine};

/// Connection settings for [`TemporalApi`].
#[derive(Debug, Clone)]
pub struct TemporalConfig {
    /// Base HTTP URL of the frontend, e.g. `http://localhost:7243`.
    pub base_url: String,
    pub namespace: String,
    /// Bound on every request, including the connect probe.
    pub timeout: Duration,
    /// Identity reported to the engine on start requests.
    pub identity: String,
}

/// HTTP client for a single Temporal namespace.
pub struct TemporalApi {
    client: reqwest::Client,
    base_url: Url,
    namespace: String,
    identity: String,
}

impl TemporalApi {
    /// Build a client without contacting the engine.
    pub fn new(config: &TemporalConfig) -> Result<Self, EngineError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| EngineError::Protocol(format!("invalid base URL '{}': {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(EngineError::Protocol(format!(
                "base URL '{}' cannot carry a path",
                config.base_url
            )));
        }
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url,
            namespace: config.namespace.clone(),
            identity: config.identity.clone(),
        })
    }

    /// Build a client and verify the namespace is reachable.
    pub async fn connect(config: &TemporalConfig) -> Result<Self, EngineError> {
        let api = Self::new(config)?;
        api.describe_namespace().await?;
        tracing::info!(
            base_url = %config.base_url,
            namespace = %config.namespace,
            "Connected to Temporal",
        );
        Ok(api)
    }

    /// `GET /api/v1/namespaces/{ns}`.
    pub async fn describe_namespace(&self) -> Result<(), EngineError> {
        let response = self
            .client
            .get(self.endpoint(&[])?)
            .send()
            .await?;
        Self::ensure_success(response, &self.namespace).await?;
        Ok(())
    }

    // ---- private helpers ----

    /// `{base}/api/v1/namespaces/{ns}[/workflows/{id}/...]`.
    fn endpoint(&self, tail: &[&str]) -> Result<Url, EngineError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| EngineError::Protocol("base URL cannot carry a path".into()))?;
            segments
                .pop_if_empty()
                .extend(["api", "v1", "namespaces", self.namespace.as_str()])
                .extend(tail);
        }
        Ok(url)
    }

    /// Map non-2xx responses onto [`EngineError`] variants.
    ///
    /// `subject` names the workflow or namespace in error messages.
    async fn ensure_success(
        response: reqwest::Response,
        subject: &str,
    ) -> Result<reqwest::Response, EngineError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(match status {
            StatusCode::NOT_FOUND => EngineError::NotFound(subject.to_string()),
            StatusCode::CONFLICT => EngineError::AlreadyStarted(subject.to_string()),
            _ => EngineError::ApiError {
                status: status.as_u16(),
                body,
            },
        })
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        subject: &str,
    ) -> Result<T, EngineError> {
        let response = Self::ensure_success(response, subject).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| EngineError::Protocol(format!("malformed response for {subject}: {e}")))
    }
}

/// Translate an execution's close event into its result or failure.
fn close_event_outcome(
    event: HistoryEvent,
    workflow_id: &str,
) -> Result<serde_json::Value, EngineError> {
    match event.event_type.as_str() {
        "EVENT_TYPE_WORKFLOW_EXECUTION_COMPLETED" => Ok(event
            .workflow_execution_completed_event_attributes
            .and_then(|attrs| attrs.result)
            .map(first_payload)
            .unwrap_or_default()),
        "EVENT_TYPE_WORKFLOW_EXECUTION_FAILED" => Err(EngineError::WorkflowFailed {
            status: ExecutionStatus::Failed,
            message: event
                .workflow_execution_failed_event_attributes
                .and_then(|attrs| attrs.failure)
                .map(|failure| failure.describe())
                .unwrap_or_else(|| "no failure message".to_string()),
        }),
        "EVENT_TYPE_WORKFLOW_EXECUTION_TERMINATED" => Err(EngineError::WorkflowFailed {
            status: ExecutionStatus::Terminated,
            message: event
                .workflow_execution_terminated_event_attributes
                .map(|attrs| attrs.reason)
                .filter(|reason| !reason.is_empty())
                .unwrap_or_else(|| "terminated without a reason".to_string()),
        }),
        "EVENT_TYPE_WORKFLOW_EXECUTION_CANCELED" => Err(EngineError::WorkflowFailed {
            status: ExecutionStatus::Canceled,
            message: "workflow execution canceled".to_string(),
        }),
        "EVENT_TYPE_WORKFLOW_EXECUTION_TIMED_OUT" => Err(EngineError::WorkflowFailed {
            status: ExecutionStatus::TimedOut,
            message: "workflow execution timed out".to_string(),
        }),
        "EVENT_TYPE_WORKFLOW_EXECUTION_CONTINUED_AS_NEW" => Err(EngineError::Protocol(format!(
            "{workflow_id} continued as new; its result belongs to a later run"
        ))),
        other => Err(EngineError::Protocol(format!(
            "unexpected close event '{other}' for {workflow_id}"
        ))),
    }
}

#[async_trait]
impl WorkflowEngine for TemporalApi {
    async fn start_workflow(&self, request: &StartWorkflow) -> Result<(), EngineError> {
        let body = StartWorkflowRequest {
            workflow_id: &request.workflow_id,
            workflow_type: Named {
                name: &request.workflow_type,
            },
            task_queue: Named {
                name: &request.task_queue,
            },
            input: [&request.input],
            retry_policy: RetryPolicyBody::from(&request.retry_policy),
            workflow_id_reuse_policy: REUSE_POLICY_REJECT_DUPLICATE,
            request_id: uuid::Uuid::new_v4().to_string(),
            identity: &self.identity,
        };

        let response = self
            .client
            .post(self.endpoint(&["workflows", &request.workflow_id])?)
            .json(&body)
            .send()
            .await?;
        let started: StartWorkflowResponse =
            Self::parse_response(response, &request.workflow_id).await?;

        tracing::debug!(
            workflow_id = %request.workflow_id,
            run_id = %started.run_id,
            task_queue = %request.task_queue,
            "Workflow execution started",
        );
        Ok(())
    }

    async fn describe(&self, workflow_id: &str) -> Result<ExecutionStatus, EngineError> {
        let response = self
            .client
            .get(self.endpoint(&["workflows", workflow_id])?)
            .send()
            .await?;
        let described: DescribeWorkflowResponse =
            Self::parse_response(response, workflow_id).await?;
        Ok(described.workflow_execution_info.status)
    }

    async fn result(&self, workflow_id: &str) -> Result<serde_json::Value, EngineError> {
        let mut url = self.endpoint(&["workflows", workflow_id, "history"])?;
        url.query_pairs_mut()
            .append_pair("historyEventFilterType", CLOSE_EVENT_FILTER);

        let response = self.client.get(url).send().await?;
        let history: HistoryResponse = Self::parse_response(response, workflow_id).await?;

        let close_event = history.history.events.into_iter().last().ok_or_else(|| {
            EngineError::Protocol(format!("{workflow_id} has no close event yet"))
        })?;
        close_event_outcome(close_event, workflow_id)
    }
}
