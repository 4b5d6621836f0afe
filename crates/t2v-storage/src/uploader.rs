//! Blob uploader: push collected artifacts to the object store.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use t2v_models::{encode_object_key, Artifact};

use crate::error::{StorageError, StorageResult};
use crate::store::{ObjectMetadata, ObjectStore};

/// Per-artifact result of a batch upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum UploadOutcome {
    Uploaded {
        prompt: String,
        #[serde(rename = "s3_path")]
        key: String,
    },
    Failed {
        prompt: String,
        error: String,
    },
}

impl UploadOutcome {
    pub fn prompt(&self) -> &str {
        match self {
            Self::Uploaded { prompt, .. } | Self::Failed { prompt, .. } => prompt,
        }
    }

    pub fn is_uploaded(&self) -> bool {
        matches!(self, Self::Uploaded { .. })
    }
}

/// Uploads artifacts one at a time and cleans up the local copies.
#[derive(Clone)]
pub struct BlobUploader {
    store: Arc<dyn ObjectStore>,
}

impl BlobUploader {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Object key an artifact is stored under.
    pub fn object_key(artifact: &Artifact) -> String {
        encode_object_key(&artifact.model, &artifact.prompt, &artifact.extension())
    }

    /// User metadata for an artifact. Non-ASCII values cannot travel in
    /// headers and are left out; the key still carries the prompt.
    pub fn metadata(artifact: &Artifact) -> ObjectMetadata {
        let mut metadata = ObjectMetadata::new();
        let mut put = |name: &str, value: &str| {
            if !value.is_empty() && value.is_ascii() {
                metadata.insert(name.to_string(), value.to_string());
            }
        };
        put("model", &artifact.model);
        put("prompt", &artifact.prompt);
        put("base_prompt", &artifact.base_prompt);
        metadata
    }

    /// Upload one artifact and return its key. The local file is not touched.
    pub async fn upload(&self, artifact: &Artifact) -> StorageResult<String> {
        let key = Self::object_key(artifact);
        self.store
            .put_file(
                artifact.path(),
                &key,
                artifact.content_type(),
                &Self::metadata(artifact),
            )
            .await?;
        Ok(key)
    }

    /// Upload artifacts sequentially.
    ///
    /// A local file is removed only after its put succeeded. Missing files
    /// and provider failures are reported per item; a credentials failure
    /// aborts the batch.
    pub async fn upload_batch(&self, artifacts: Vec<Artifact>) -> StorageResult<Vec<UploadOutcome>> {
        let mut outcomes = Vec::with_capacity(artifacts.len());

        for artifact in artifacts {
            match self.upload(&artifact).await {
                Ok(key) => {
                    if let Err(e) = tokio::fs::remove_file(artifact.path()).await {
                        warn!(
                            path = %artifact.path().display(),
                            error = %e,
                            "Uploaded but failed to remove local file"
                        );
                    }
                    info!(bucket = self.store.bucket(), key = %key, "Artifact uploaded");
                    outcomes.push(UploadOutcome::Uploaded {
                        prompt: artifact.prompt,
                        key,
                    });
                }
                Err(e) if e.is_fatal_for_batch() => {
                    error!(error = %e, "Storage credentials unavailable, aborting upload batch");
                    return Err(e);
                }
                Err(e @ StorageError::FileNotFound(_)) => {
                    warn!(prompt = %artifact.prompt, error = %e, "Artifact disappeared before upload");
                    outcomes.push(UploadOutcome::Failed {
                        prompt: artifact.prompt,
                        error: e.to_string(),
                    });
                }
                Err(e) => {
                    error!(
                        prompt = %artifact.prompt,
                        path = %artifact.path().display(),
                        error = %e,
                        "Upload failed, keeping local file"
                    );
                    outcomes.push(UploadOutcome::Failed {
                        prompt: artifact.prompt,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(outcomes)
    }
}
