//! S3 client implementation.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{classify_provider_error, StorageError, StorageResult};
use crate::store::{ObjectMetadata, ObjectStore};

/// Default bucket holding generated videos.
pub const DEFAULT_BUCKET: &str = "text2videoviewer";

/// Default region when `AWS_REGION` is not set.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Configuration for the S3 client.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Bucket name
    pub bucket_name: String,
    /// Region
    pub region: String,
    /// Custom endpoint (S3-compatible stores); enables path-style addressing
    pub endpoint_url: Option<String>,
    /// Access key ID
    pub access_key_id: Option<String>,
    /// Secret access key
    pub secret_access_key: Option<String>,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket_name: DEFAULT_BUCKET.to_string(),
            region: DEFAULT_REGION.to_string(),
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

impl S3Config {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        Self {
            bucket_name: non_empty("S3_BUCKET_NAME").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            region: non_empty("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            endpoint_url: non_empty("AWS_ENDPOINT_URL"),
            access_key_id: non_empty("AWS_ACCESS_KEY_ID"),
            secret_access_key: non_empty("AWS_SECRET_ACCESS_KEY"),
        }
    }

    /// Static credentials when both keys are set, `None` to use the default chain.
    pub fn static_credentials(&self) -> StorageResult<Option<Credentials>> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(key), Some(secret)) => Ok(Some(Credentials::new(key, secret, None, None, "env"))),
            (None, None) => Ok(None),
            _ => Err(StorageError::credentials("incomplete credentials provided")),
        }
    }
}

/// S3 storage client.
#[derive(Clone)]
pub struct S3Client {
    client: Client,
    bucket: String,
}

impl S3Client {
    /// Create a new S3 client from configuration.
    pub async fn new(config: S3Config) -> StorageResult<Self> {
        let region = Region::new(config.region.clone());

        let mut builder = match config.static_credentials()? {
            Some(credentials) => Builder::new()
                .behavior_version(BehaviorVersion::latest())
                .region(region)
                .credentials_provider(credentials),
            None => {
                let shared = aws_config::defaults(BehaviorVersion::latest())
                    .region(region)
                    .load()
                    .await;
                Builder::from(&shared)
            }
        };

        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let client = Client::from_conf(builder.build());

        info!(
            bucket = %config.bucket_name,
            region = %config.region,
            "S3 client initialized"
        );

        Ok(Self {
            client,
            bucket: config.bucket_name,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        Self::new(S3Config::from_env()).await
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_file(
        &self,
        path: &Path,
        key: &str,
        content_type: &str,
        metadata: &ObjectMetadata,
    ) -> StorageResult<()> {
        debug!("Uploading {} to {}", path.display(), key);

        if tokio::fs::metadata(path).await.is_err() {
            return Err(StorageError::FileNotFound(path.to_path_buf()));
        }

        let body = ByteStream::from_path(path).await.map_err(|e| {
            if path.exists() {
                StorageError::upload_failed(e.to_string())
            } else {
                StorageError::FileNotFound(path.to_path_buf())
            }
        })?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .set_metadata(Some(metadata.clone()))
            .send()
            .await
            .map_err(|e| classify_provider_error(DisplayErrorContext(&e).to_string()))?;

        info!("Uploaded {} to {}", path.display(), key);
        Ok(())
    }

    async fn list_keys(&self) -> StorageResult<Vec<String>> {
        debug!("Listing objects in bucket {}", self.bucket);

        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket);

            if let Some(token) = continuation_token {
                request = request.continuation_token(token);
            }

            let response = request.send().await.map_err(|e| {
                match classify_provider_error(DisplayErrorContext(&e).to_string()) {
                    StorageError::UploadFailed(msg) => StorageError::ListFailed(msg),
                    other => other,
                }
            })?;

            if let Some(ref contents) = response.contents {
                keys.extend(contents.iter().filter_map(|obj| obj.key.clone()));
            }

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token;
            } else {
                break;
            }
        }

        Ok(keys)
    }

    async fn head_metadata(&self, key: &str) -> StorageResult<ObjectMetadata> {
        let response = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let msg = DisplayErrorContext(&e).to_string();
                if msg.contains("NotFound") || msg.contains("NoSuchKey") {
                    StorageError::not_found(key)
                } else {
                    StorageError::AwsSdk(msg)
                }
            })?;

        Ok(response.metadata().cloned().unwrap_or_else(HashMap::new))
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                StorageError::AwsSdk(format!(
                    "S3 connectivity check failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = S3Config::default();
        assert_eq!(config.bucket_name, "text2videoviewer");
        assert_eq!(config.region, "us-east-1");
        assert!(config.endpoint_url.is_none());
    }

    #[test]
    fn test_static_credentials() {
        let config = S3Config {
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            secret_access_key: Some("secret".to_string()),
            ..Default::default()
        };
        let creds = config.static_credentials().unwrap().unwrap();
        assert_eq!(creds.access_key_id(), "AKIDEXAMPLE");

        assert!(S3Config::default().static_credentials().unwrap().is_none());
    }

    #[test]
    fn test_incomplete_credentials() {
        let config = S3Config {
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            ..Default::default()
        };
        let err = config.static_credentials().unwrap_err();
        assert!(matches!(err, StorageError::Credentials(_)));
        assert!(err.to_string().contains("incomplete credentials"));
    }
}
