//! Wire types for the Temporal HTTP API.
//!
//! Payloads use the API's JSON shorthand: a `json/plain` payload is sent
//! and received as the bare JSON value.

use photo_core::retry::RetryPolicy;
use serde::{Deserialize, Serialize};

use crate::status::ExecutionStatus;

/// Reject a start request whose workflow id was ever used before.
pub const REUSE_POLICY_REJECT_DUPLICATE: &str = "WORKFLOW_ID_REUSE_POLICY_REJECT_DUPLICATE";

/// Filter returning only the close event of an execution's history.
pub const CLOSE_EVENT_FILTER: &str = "HISTORY_EVENT_FILTER_TYPE_CLOSE_EVENT";

#[derive(Debug, Serialize)]
pub struct Named<'a> {
    pub name: &'a str,
}

/// Body of `POST /api/v1/namespaces/{ns}/workflows/{id}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartWorkflowRequest<'a> {
    pub workflow_id: &'a str,
    pub workflow_type: Named<'a>,
    pub task_queue: Named<'a>,
    pub input: [&'a serde_json::Value; 1],
    pub retry_policy: RetryPolicyBody,
    pub workflow_id_reuse_policy: &'static str,
    pub request_id: String,
    pub identity: &'a str,
}

/// Retry policy in protobuf JSON form (durations as `"<secs>s"`).
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicyBody {
    pub initial_interval: String,
    pub backoff_coefficient: f64,
    pub maximum_attempts: u32,
}

impl From<&RetryPolicy> for RetryPolicyBody {
    fn from(policy: &RetryPolicy) -> Self {
        Self {
            initial_interval: format!("{}s", policy.initial_interval.as_secs_f64()),
            backoff_coefficient: policy.backoff_coefficient,
            maximum_attempts: policy.maximum_attempts,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartWorkflowResponse {
    #[serde(default)]
    pub run_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeWorkflowResponse {
    #[serde(default)]
    pub workflow_execution_info: ExecutionInfo,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExecutionInfo {
    #[serde(default)]
    pub status: ExecutionStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub history: History,
}

#[derive(Debug, Default, Deserialize)]
pub struct History {
    #[serde(default)]
    pub events: Vec<HistoryEvent>,
}

/// A history event. Only the close-event attributes are modelled.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEvent {
    #[serde(default)]
    pub event_type: String,
    pub workflow_execution_completed_event_attributes: Option<CompletedAttributes>,
    pub workflow_execution_failed_event_attributes: Option<FailedAttributes>,
    pub workflow_execution_terminated_event_attributes: Option<TerminatedAttributes>,
}

#[derive(Debug, Deserialize)]
pub struct CompletedAttributes {
    /// Payloads, either as a shorthand array or `{"payloads": [...]}`.
    pub result: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct FailedAttributes {
    pub failure: Option<Failure>,
}

#[derive(Debug, Deserialize)]
pub struct TerminatedAttributes {
    #[serde(default)]
    pub reason: String,
}

/// Temporal failure, possibly wrapping a chain of causes.
#[derive(Debug, Deserialize)]
pub struct Failure {
    #[serde(default)]
    pub message: String,
    pub cause: Option<Box<Failure>>,
}

impl Failure {
    /// Flatten the cause chain into `outer: inner: innermost`.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        let mut current = Some(self);
        while let Some(failure) = current {
            if !failure.message.is_empty() {
                parts.push(failure.message.as_str());
            }
            current = failure.cause.as_deref();
        }
        if parts.is_empty() {
            "no failure message".to_string()
        } else {
            parts.join(": ")
        }
    }
}

/// Extract the first payload from a `Payloads` value.
pub fn first_payload(payloads: serde_json::Value) -> serde_json::Value {
    let list = match payloads {
        serde_json::Value::Object(mut map) => map.remove("payloads").unwrap_or_default(),
        other => other,
    };
    match list {
        serde_json::Value::Array(items) => items.into_iter().next().unwrap_or_default(),
        other => other,
    }
}
