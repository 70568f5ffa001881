//! Pre-admission object existence check.

use photo_storage::{ObjectHead, ObjectStorage};

use crate::JobError;

/// Probe `bucket/key` once. Any failure rejects the job; nothing is retried.
pub async fn check_object(
    storage: &dyn ObjectStorage,
    bucket: &str,
    key: &str,
) -> Result<ObjectHead, JobError> {
    match storage.head(bucket, key).await {
        Ok(head) => Ok(head),
        Err(source) => {
            tracing::info!(bucket, key, error = %source, "Object not accessible, job rejected");
            Err(JobError::ObjectNotAccessible {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::testing::FakeStorage;

    #[tokio::test]
    async fn existing_object_returns_metadata() {
        let storage = FakeStorage::new();
        storage.put("raw", "a.jpg", "image/jpeg", 42);

        let head = check_object(&storage, "raw", "a.jpg").await.unwrap();
        assert_eq!(head.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(head.size, Some(42));
    }

    #[tokio::test]
    async fn missing_object_is_not_accessible() {
        let storage = FakeStorage::new();

        let err = check_object(&storage, "raw", "missing.jpg").await.unwrap_err();
        assert_matches!(
            err,
            JobError::ObjectNotAccessible { ref bucket, ref key, .. }
                if bucket == "raw" && key == "missing.jpg"
        );
        assert_eq!(storage.head_calls(), 1);
    }
}
