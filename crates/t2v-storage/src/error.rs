//! Storage error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to configure storage client: {0}")]
    ConfigError(String),

    #[error("Credentials not available: {0}")]
    Credentials(String),

    #[error("The file {} was not found", .0.display())]
    FileNotFound(PathBuf),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("AWS SDK error: {0}")]
    AwsSdk(String),
}

impl StorageError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn credentials(msg: impl Into<String>) -> Self {
        Self::Credentials(msg.into())
    }

    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }

    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }

    /// Whether retrying other uploads in the same batch is pointless.
    pub fn is_fatal_for_batch(&self) -> bool {
        matches!(self, Self::Credentials(_) | Self::ConfigError(_))
    }
}

/// Markers in provider error messages that point at bad or missing credentials.
const CREDENTIAL_MARKERS: &[&str] = &[
    "credentials",
    "invalidaccesskeyid",
    "signaturedoesnotmatch",
    "expiredtoken",
    "invalidtoken",
];

/// Classify a provider error message into a storage error.
pub fn classify_provider_error(message: impl Into<String>) -> StorageError {
    let message = message.into();
    let lower = message.to_lowercase();
    if CREDENTIAL_MARKERS.iter().any(|m| lower.contains(m)) {
        StorageError::Credentials(message)
    } else {
        StorageError::UploadFailed(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_credentials() {
        assert!(matches!(
            classify_provider_error("dispatch failure: no credentials in the property bag"),
            StorageError::Credentials(_)
        ));
        assert!(matches!(
            classify_provider_error("service error: InvalidAccessKeyId: The AWS Access Key Id does not exist"),
            StorageError::Credentials(_)
        ));
    }

    #[test]
    fn test_classify_other() {
        let err = classify_provider_error("service error: SlowDown");
        assert!(matches!(err, StorageError::UploadFailed(_)));
        assert!(!err.is_fatal_for_batch());
    }
}
