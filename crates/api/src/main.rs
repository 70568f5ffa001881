use std::net::SocketAddr;
use std::sync::Arc;

use photo_api::config::{DatabaseConfig, LogConfig, ServerConfig, TemporalSettings};
use photo_api::router::build_app_router;
use photo_api::state::AppState;
use photo_core::api_key::ApiKeyDigest;
use photo_pipeline::dispatcher::EngineHandle;
use photo_pipeline::ledger::{JobLedger, NullLedger, PgLedger};
use photo_pipeline::submission::JobService;
use photo_pipeline::uploads::UploadService;
use photo_storage::s3::S3Storage;
use photo_storage::ObjectStorage;
use photo_temporal::api::TemporalApi;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let log = LogConfig::from_env();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log.default_directive().into()),
        )
        .with(log.json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!log.json).then(tracing_subscriber::fmt::layer))
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Ledger ---
    let ledger = connect_ledger(config.database.as_ref()).await;

    // --- Object storage ---
    let storage: Arc<dyn ObjectStorage> = Arc::new(
        S3Storage::connect(&config.storage.s3_config())
            .await
            .expect("Failed to configure S3 client"),
    );

    // --- Workflow engine ---
    let engine = connect_engine(&config.temporal).await;

    // --- App state ---
    let jobs = Arc::new(JobService::new(
        Arc::clone(&storage),
        ledger,
        engine,
        config.temporal.dispatch_settings(),
    ));
    let uploads = Arc::new(UploadService::new(
        storage,
        config.storage.bucket_raw.clone(),
        config.storage.max_upload_size,
        config.storage.presign_expires(),
    ));
    let state = AppState {
        api_key: ApiKeyDigest::from_key(&config.api_key),
        config: Arc::new(config.clone()),
        jobs,
        uploads,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Connect the ledger database, falling back to [`NullLedger`] when it is
/// not configured or not reachable.
async fn connect_ledger(database: Option<&DatabaseConfig>) -> Arc<dyn JobLedger> {
    let Some(database) = database else {
        tracing::warn!("DATABASE_URL not set, running without a job ledger");
        return Arc::new(NullLedger);
    };

    let pool = match photo_db::create_pool(&database.url, &database.pool_settings()).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(error = %e, "Database unreachable, running without a job ledger");
            return Arc::new(NullLedger);
        }
    };
    tracing::info!("Database connection pool created");

    if let Err(e) = photo_db::health_check(&pool).await {
        tracing::warn!(error = %e, "Database health check failed, running without a job ledger");
        return Arc::new(NullLedger);
    }

    if let Err(e) = photo_db::run_migrations(&pool).await {
        tracing::error!(error = %e, "Database migrations failed, running without a job ledger");
        return Arc::new(NullLedger);
    }
    tracing::info!("Database migrations applied");

    Arc::new(PgLedger::new(pool))
}

/// Connect the workflow engine. A failed connection leaves the handle
/// disconnected; submissions and status queries then fail fast.
async fn connect_engine(settings: &TemporalSettings) -> EngineHandle {
    match TemporalApi::connect(&settings.client_config()).await {
        Ok(api) => EngineHandle::connected(Arc::new(api)),
        Err(e) => {
            tracing::error!(
                url = %settings.http_url,
                namespace = %settings.namespace,
                error = %e,
                "Failed to connect to Temporal, workflow operations disabled",
            );
            EngineHandle::disconnected()
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
