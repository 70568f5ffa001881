use photo_storage::StorageError;
use photo_temporal::EngineError;

/// Errors surfaced by job submission and status queries.
///
/// Ledger failures never appear here; the ledger swallows them.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// The referenced object could not be probed (missing, forbidden,
    /// unreachable or timed out).
    #[error("Object s3://{bucket}/{key} is not accessible")]
    ObjectNotAccessible {
        bucket: String,
        key: String,
        #[source]
        source: StorageError,
    },

    /// No workflow engine connection was established at startup.
    #[error("Workflow engine is not connected")]
    EngineUnavailable,

    /// The engine refused or never received the start request.
    #[error("Failed to dispatch workflow for job {job_id}")]
    DispatchFailed {
        job_id: String,
        #[source]
        source: EngineError,
    },

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    /// A transient engine fault while querying status. The ledger is left
    /// untouched.
    #[error("Failed to query workflow status for job {job_id}")]
    EngineQueryFailed {
        job_id: String,
        #[source]
        source: EngineError,
    },
}

impl JobError {
    /// The error and its source chain as one `outer: inner` line.
    pub fn detail(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

/// Errors from issuing a presigned upload form.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Invalid(#[from] photo_core::error::CoreError),

    #[error("Failed to presign upload: {0}")]
    Presign(#[from] StorageError),
}
