//! Workflow execution status as reported by the Temporal HTTP API.

use serde::Deserialize;

/// Closed set of execution states. Values the engine adds later fall
/// back to [`ExecutionStatus::Unspecified`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ExecutionStatus {
    #[serde(rename = "WORKFLOW_EXECUTION_STATUS_RUNNING")]
    Running,
    #[serde(rename = "WORKFLOW_EXECUTION_STATUS_COMPLETED")]
    Completed,
    #[serde(rename = "WORKFLOW_EXECUTION_STATUS_FAILED")]
    Failed,
    #[serde(rename = "WORKFLOW_EXECUTION_STATUS_CANCELED")]
    Canceled,
    #[serde(rename = "WORKFLOW_EXECUTION_STATUS_TERMINATED")]
    Terminated,
    #[serde(rename = "WORKFLOW_EXECUTION_STATUS_CONTINUED_AS_NEW")]
    ContinuedAsNew,
    #[serde(rename = "WORKFLOW_EXECUTION_STATUS_TIMED_OUT")]
    TimedOut,
    #[default]
    #[serde(other)]
    Unspecified,
}

impl ExecutionStatus {
    /// Short lowercase label for logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Terminated => "terminated",
            Self::ContinuedAsNew => "continued_as_new",
            Self::TimedOut => "timed_out",
            Self::Unspecified => "unspecified",
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
