use crate::status::ExecutionStatus;

/// Errors from the workflow engine layer.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Temporal returned a non-2xx status code not covered below.
    #[error("Temporal API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// No execution (or namespace) with this id exists, or it was purged.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A start request reused an id the engine has already seen.
    #[error("Workflow execution already started: {0}")]
    AlreadyStarted(String),

    /// The execution closed without a result.
    #[error("Workflow {status}: {message}")]
    WorkflowFailed {
        status: ExecutionStatus,
        message: String,
    },

    /// The configured endpoint or a response body could not be used.
    #[error("Unexpected Temporal response: {0}")]
    Protocol(String),
}

impl EngineError {
    /// The engine positively reports the execution does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
