/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Free-form job metadata supplied by clients.
pub type JobMetadata = serde_json::Map<String, serde_json::Value>;
