//! Upload naming and validation rules for direct-to-storage uploads.

use crate::error::CoreError;
use crate::types::Timestamp;

/// Default and upper bound for a single upload, in bytes.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 25_000_000;

/// Value of the `x-amz-meta-origin` field on presigned uploads.
pub const PRESIGNED_ORIGIN: &str = "presigned";

/// File extension used for a declared MIME type.
///
/// Unknown types fall back to `.bin`.
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "image/webp" => ".webp",
        "image/heic" | "image/heif" => ".heic",
        _ => ".bin",
    }
}

/// Build a fresh object key: `[<prefix>/]YYYY/MM/DD/<uuid><ext>`.
pub fn new_object_key(prefix: Option<&str>, content_type: &str, now: Timestamp) -> String {
    let base = format!(
        "{}/{}{}",
        now.format("%Y/%m/%d"),
        uuid::Uuid::new_v4(),
        extension_for(content_type)
    );
    match prefix.map(|p| p.trim_end_matches('/')).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{prefix}/{base}"),
        None => base,
    }
}

/// Validate an upload request against the configured size ceiling.
pub fn validate_upload_request(
    content_type: &str,
    max_bytes: u64,
    limit: u64,
) -> Result<(), CoreError> {
    if content_type.trim().is_empty() {
        return Err(CoreError::Validation("content_type must not be empty".into()));
    }
    if max_bytes == 0 || max_bytes > limit {
        return Err(CoreError::Validation(format!(
            "max_bytes must be between 1 and {limit}, got {max_bytes}"
        )));
    }
    Ok(())
}
