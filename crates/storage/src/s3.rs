//! [`ObjectStorage`] backed by Amazon S3 or an S3-compatible endpoint.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;

use crate::presign::{build_presigned_post, SigningCredentials};
use crate::{ObjectHead, ObjectStorage, PresignPostRequest, PresignedPost, StorageError};

/// Connection settings for [`S3Storage`].
#[derive(Debug, Clone)]
pub struct S3Config {
    pub region: String,
    /// Named profile from the shared AWS config files.
    pub profile: Option<String>,
    /// Custom endpoint (MinIO, LocalStack). Enables path-style addressing.
    pub endpoint_url: Option<String>,
    /// Bound on a single metadata probe.
    pub timeout: Duration,
}

/// S3 client plus the credentials provider used for POST policy signing.
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    credentials: SharedCredentialsProvider,
    region: String,
    endpoint_url: Option<String>,
    timeout: Duration,
}

impl S3Storage {
    /// Resolve region, profile and credentials from the default AWS chain.
    pub async fn connect(config: &S3Config) -> Result<Self, StorageError> {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));
        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let credentials = sdk_config.credentials_provider().ok_or_else(|| {
            StorageError::Credentials("no AWS credentials provider configured".into())
        })?;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint_url.is_some())
            .build();

        tracing::info!(
            region = %config.region,
            profile = config.profile.as_deref().unwrap_or("default"),
            endpoint = config.endpoint_url.as_deref().unwrap_or("aws"),
            "S3 client configured",
        );

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            credentials,
            region: config.region.clone(),
            endpoint_url: config.endpoint_url.clone(),
            timeout: config.timeout,
        })
    }

    /// POST target for `bucket`.
    fn bucket_url(&self, bucket: &str) -> String {
        match &self.endpoint_url {
            Some(endpoint) => format!("{}/{bucket}", endpoint.trim_end_matches('/')),
            None => format!("https://{bucket}.s3.{}.amazonaws.com", self.region),
        }
    }

    async fn signing_credentials(&self) -> Result<SigningCredentials, StorageError> {
        let creds = self
            .credentials
            .provide_credentials()
            .await
            .map_err(|e| StorageError::Credentials(DisplayErrorContext(&e).to_string()))?;
        Ok(SigningCredentials {
            access_key_id: creds.access_key_id().to_string(),
            secret_access_key: creds.secret_access_key().to_string(),
            session_token: creds.session_token().map(str::to_string),
        })
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectHead, StorageError> {
        let not_accessible = |reason: String| StorageError::NotAccessible {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason,
        };

        let probe = self.client.head_object().bucket(bucket).key(key).send();
        let output = match tokio::time::timeout(self.timeout, probe).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(not_accessible(DisplayErrorContext(&e).to_string())),
            Err(_) => {
                return Err(not_accessible(format!(
                    "timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        };

        Ok(ObjectHead {
            content_type: output.content_type().map(str::to_string),
            size: output.content_length(),
        })
    }

    async fn presign_post(
        &self,
        request: &PresignPostRequest,
    ) -> Result<PresignedPost, StorageError> {
        let credentials = self.signing_credentials().await?;
        Ok(build_presigned_post(
            request,
            &credentials,
            &self.region,
            self.bucket_url(&request.bucket),
            chrono::Utc::now(),
        ))
    }
}
