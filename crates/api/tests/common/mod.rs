#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use photo_api::config::{ServerConfig, StorageConfig, TemporalSettings};
use photo_api::router::build_app_router;
use photo_api::state::AppState;
use photo_core::api_key::ApiKeyDigest;
use photo_pipeline::dispatcher::EngineHandle;
use photo_pipeline::ledger::JobLedger;
use photo_pipeline::submission::JobService;
use photo_pipeline::testing::{FakeEngine, FakeStorage, MemoryLedger};
use photo_pipeline::uploads::UploadService;
use tower::ServiceExt;

pub const API_KEY: &str = "test-api-key";
pub const RAW_BUCKET: &str = "photos-raw";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["*".to_string()],
        request_timeout_secs: 30,
        api_key: API_KEY.to_string(),
        database: None,
        storage: StorageConfig {
            region: "us-west-2".to_string(),
            profile: None,
            endpoint_url: None,
            bucket_raw: RAW_BUCKET.to_string(),
            timeout_secs: 5,
            presign_expires_secs: 300,
            max_upload_size: 25_000_000,
        },
        temporal: TemporalSettings {
            http_url: "http://localhost:7243".to_string(),
            namespace: "default".to_string(),
            task_queue: "image-tasks".to_string(),
            workflow_name: "image_processing_workflow".to_string(),
            timeout_secs: 5,
        },
    }
}

/// Application wired to in-memory collaborators, plus handles to inspect them.
pub struct TestApp {
    pub router: Router,
    pub storage: Arc<FakeStorage>,
    pub ledger: Arc<MemoryLedger>,
    pub engine: Arc<FakeEngine>,
}

/// Build the full application router with all middleware layers over fakes.
pub fn build_test_app() -> TestApp {
    let storage = Arc::new(FakeStorage::new());
    let ledger = Arc::new(MemoryLedger::new());
    let engine = Arc::new(FakeEngine::new());
    let router = build_app_with(
        test_config(),
        storage.clone(),
        ledger.clone(),
        EngineHandle::connected(engine.clone()),
    );
    TestApp {
        router,
        storage,
        ledger,
        engine,
    }
}

/// Build the router over arbitrary collaborators.
pub fn build_app_with(
    config: ServerConfig,
    storage: Arc<FakeStorage>,
    ledger: Arc<dyn JobLedger>,
    engine: EngineHandle,
) -> Router {
    let jobs = Arc::new(JobService::new(
        storage.clone(),
        ledger,
        engine,
        config.temporal.dispatch_settings(),
    ));
    let uploads = Arc::new(UploadService::new(
        storage,
        config.storage.bucket_raw.clone(),
        config.storage.max_upload_size,
        Duration::from_secs(config.storage.presign_expires_secs),
    ));
    let state = AppState {
        api_key: ApiKeyDigest::from_key(&config.api_key),
        config: Arc::new(config.clone()),
        jobs,
        uploads,
    };
    build_app_router(state, &config)
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

/// Authenticated GET.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header("authorization", format!("Bearer {API_KEY}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Authenticated POST with a JSON body.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::post(uri)
        .header("authorization", format!("Bearer {API_KEY}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
