//! Object store abstraction.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use crate::error::StorageResult;

/// User metadata attached to an object.
pub type ObjectMetadata = HashMap<String, String>;

/// Blob store the pipeline uploads into and the catalog is rebuilt from.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket name, for logging.
    fn bucket(&self) -> &str;

    /// Upload a local file under `key` with user metadata.
    async fn put_file(
        &self,
        path: &Path,
        key: &str,
        content_type: &str,
        metadata: &ObjectMetadata,
    ) -> StorageResult<()>;

    /// List every key in the bucket across all pages, in listing order.
    async fn list_keys(&self) -> StorageResult<Vec<String>>;

    /// Fetch the user metadata of one object.
    async fn head_metadata(&self, key: &str) -> StorageResult<ObjectMetadata>;

    /// Check that the bucket is reachable.
    async fn check_connectivity(&self) -> StorageResult<()>;
}
