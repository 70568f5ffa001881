use std::str::FromStr;
use std::time::Duration;

use photo_core::upload::DEFAULT_MAX_UPLOAD_BYTES;
use photo_db::PoolSettings;
use photo_pipeline::dispatcher::{DEFAULT_TASK_QUEUE, DEFAULT_WORKFLOW_TYPE};
use photo_pipeline::submission::DispatchSettings;
use photo_storage::s3::S3Config;
use photo_temporal::api::TemporalConfig;

/// Server configuration loaded from environment variables.
///
/// Everything except `API_KEY` and the bucket names has a default suitable
/// for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins. A single `*` allows any origin without
    /// credentials.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Static bearer key every non-health route requires.
    pub api_key: String,
    /// `None` runs without a ledger.
    pub database: Option<DatabaseConfig>,
    pub storage: StorageConfig,
    pub temporal: TemporalSettings,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_secs(self.acquire_timeout_secs),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub region: String,
    pub profile: Option<String>,
    pub endpoint_url: Option<String>,
    /// Bucket uploads land in and jobs read from.
    pub bucket_raw: String,
    pub timeout_secs: u64,
    pub presign_expires_secs: u64,
    pub max_upload_size: u64,
}

impl StorageConfig {
    pub fn s3_config(&self) -> S3Config {
        S3Config {
            region: self.region.clone(),
            profile: self.profile.clone(),
            endpoint_url: self.endpoint_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn presign_expires(&self) -> Duration {
        Duration::from_secs(self.presign_expires_secs)
    }
}

#[derive(Debug, Clone)]
pub struct TemporalSettings {
    pub http_url: String,
    pub namespace: String,
    pub task_queue: String,
    pub workflow_name: String,
    pub timeout_secs: u64,
}

impl TemporalSettings {
    pub fn client_config(&self) -> TemporalConfig {
        TemporalConfig {
            base_url: self.http_url.clone(),
            namespace: self.namespace.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            identity: format!("photo-api@{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            workflow_type: self.workflow_name.clone(),
            task_queue: self.task_queue.clone(),
        }
    }
}

/// Log output settings, read before anything else so startup is traced.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default level when `RUST_LOG` is unset (default: `info`).
    pub level: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl LogConfig {
    /// | Env Var      | Default |
    /// |--------------|---------|
    /// | `LOG_LEVEL`  | `info`  |
    /// | `LOG_FORMAT` | `text`  |
    pub fn from_env() -> Self {
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
        let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
        Self { level, json }
    }

    /// Filter directive used when `RUST_LOG` is unset.
    pub fn default_directive(&self) -> String {
        let level = &self.level;
        format!(
            "photo_api={level},photo_pipeline={level},photo_temporal={level},\
             photo_storage={level},photo_db={level},tower_http={level}"
        )
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                      |
    /// |---------------------------------|------------------------------|
    /// | `HOST`                          | `0.0.0.0`                    |
    /// | `PORT`                          | `8000`                       |
    /// | `CORS_ORIGINS`                  | `*`                          |
    /// | `REQUEST_TIMEOUT_SECS`          | `30`                         |
    /// | `API_KEY`                       | required                     |
    /// | `DATABASE_URL`                  | unset (no ledger)            |
    /// | `DATABASE_MAX_CONNECTIONS`      | `10`                         |
    /// | `DATABASE_ACQUIRE_TIMEOUT_SECS` | `5`                          |
    /// | `AWS_REGION`                    | `us-west-2`                  |
    /// | `AWS_PROFILE`                   | unset                        |
    /// | `S3_ENDPOINT_URL`               | unset                        |
    /// | `S3_BUCKET_RAW`                 | required                     |
    /// | `STORAGE_TIMEOUT_SECS`          | `10`                         |
    /// | `PRESIGN_EXPIRES_SECONDS`       | `300`                        |
    /// | `MAX_UPLOAD_SIZE`               | `25000000`                   |
    /// | `TEMPORAL_HTTP_URL`             | `http://localhost:7243`      |
    /// | `TEMPORAL_NAMESPACE`            | `default`                    |
    /// | `TEMPORAL_TASK_QUEUE`           | `image-tasks`                |
    /// | `TEMPORAL_WORKFLOW_NAME`        | `image_processing_workflow`  |
    /// | `TEMPORAL_TIMEOUT_SECS`         | `10`                         |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = parse_env("PORT", 8000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_env("REQUEST_TIMEOUT_SECS", 30);
        let api_key = required_env("API_KEY");

        let database = optional_env("DATABASE_URL").map(|url| DatabaseConfig {
            url,
            max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10),
            acquire_timeout_secs: parse_env("DATABASE_ACQUIRE_TIMEOUT_SECS", 5),
        });

        let storage = StorageConfig {
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-west-2".into()),
            profile: optional_env("AWS_PROFILE"),
            endpoint_url: optional_env("S3_ENDPOINT_URL"),
            bucket_raw: required_env("S3_BUCKET_RAW"),
            timeout_secs: parse_env("STORAGE_TIMEOUT_SECS", 10),
            presign_expires_secs: parse_env("PRESIGN_EXPIRES_SECONDS", 300),
            max_upload_size: parse_env("MAX_UPLOAD_SIZE", DEFAULT_MAX_UPLOAD_BYTES),
        };

        let temporal = TemporalSettings {
            http_url: std::env::var("TEMPORAL_HTTP_URL")
                .unwrap_or_else(|_| "http://localhost:7243".into()),
            namespace: std::env::var("TEMPORAL_NAMESPACE").unwrap_or_else(|_| "default".into()),
            task_queue: std::env::var("TEMPORAL_TASK_QUEUE")
                .unwrap_or_else(|_| DEFAULT_TASK_QUEUE.into()),
            workflow_name: std::env::var("TEMPORAL_WORKFLOW_NAME")
                .unwrap_or_else(|_| DEFAULT_WORKFLOW_TYPE.into()),
            timeout_secs: parse_env("TEMPORAL_TIMEOUT_SECS", 10),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            api_key,
            database,
            storage,
            temporal,
        }
    }

    /// `CORS_ORIGINS=*` allows any origin.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

/// Parse `name`, falling back to `default` when unset. Panics on an
/// unparsable value.
fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} must be a valid {}: {e}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}

fn required_env(name: &str) -> String {
    optional_env(name).unwrap_or_else(|| panic!("{name} must be set"))
}

/// Unset and blank values both read as `None`.
fn optional_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
