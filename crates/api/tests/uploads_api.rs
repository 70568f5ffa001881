//! Integration tests for `POST /uploads/init`.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, post_json, RAW_BUCKET};
use photo_storage::PostCondition;
use serde_json::json;

#[tokio::test]
async fn init_upload_returns_presigned_form() {
    let app = build_test_app();

    let response = post_json(
        app.router.clone(),
        "/uploads/init",
        json!({ "content_type": "image/webp", "max_bytes": 5000, "key_prefix": "mobile" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let key = json["key"].as_str().unwrap();
    assert!(key.starts_with("mobile/"), "got {key}");
    assert!(key.ends_with(".webp"));
    assert!(json["url"].as_str().unwrap().contains(RAW_BUCKET));
    assert_eq!(json["fields"]["Content-Type"], "image/webp");
    assert_eq!(json["fields"]["x-amz-meta-origin"], "presigned");
    assert_eq!(json["fields"]["key"], key);

    let request = app.storage.last_presign().unwrap();
    assert_eq!(request.bucket, RAW_BUCKET);
    assert!(request
        .conditions
        .contains(&PostCondition::ContentLengthRange { min: 1, max: 5000 }));
}

#[tokio::test]
async fn init_upload_rejects_oversized_request() {
    let app = build_test_app();

    let response = post_json(
        app.router.clone(),
        "/uploads/init",
        json!({ "content_type": "image/jpeg", "max_bytes": 25_000_001u64 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    assert!(app.storage.last_presign().is_none());
}

#[tokio::test]
async fn init_upload_rejects_empty_content_type() {
    let app = build_test_app();

    let response =
        post_json(app.router.clone(), "/uploads/init", json!({ "content_type": "" })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
