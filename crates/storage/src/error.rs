/// Errors from the object storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The metadata probe failed: missing object, denied access, network
    /// fault or timeout. Callers cannot tell these apart.
    #[error("Object {bucket}/{key} is not accessible: {reason}")]
    NotAccessible {
        bucket: String,
        key: String,
        reason: String,
    },

    /// No usable credentials for signing.
    #[error("Storage credentials unavailable: {0}")]
    Credentials(String),
}
