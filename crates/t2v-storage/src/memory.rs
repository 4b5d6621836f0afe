//! In-process object store for dry runs and tests.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::store::{ObjectMetadata, ObjectStore};

/// An object held by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
    pub metadata: ObjectMetadata,
}

/// Object store backed by an ordered map; lists keys in byte order like S3.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bucket: String,
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    /// Insert an object directly.
    pub async fn insert(&self, key: impl Into<String>, data: Vec<u8>, metadata: ObjectMetadata) {
        self.objects.write().await.insert(
            key.into(),
            StoredObject {
                data,
                content_type: "application/octet-stream".to_string(),
                metadata,
            },
        );
    }

    pub async fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
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
        let data = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::FileNotFound(path.to_path_buf())
            } else {
                StorageError::Io(e)
            }
        })?;

        debug!("Stored {} bytes under {}", data.len(), key);
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
                metadata: metadata.clone(),
            },
        );
        Ok(())
    }

    async fn list_keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.objects.read().await.keys().cloned().collect())
    }

    async fn head_metadata(&self, key: &str) -> StorageResult<ObjectMetadata> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|obj| obj.metadata.clone())
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("b.mp4");
        std::fs::write(&file, b"video").unwrap();

        let store = MemoryStore::new("bucket");
        store.insert("z/last.mp4", vec![], ObjectMetadata::new()).await;

        let mut metadata = ObjectMetadata::new();
        metadata.insert("model".to_string(), "a".to_string());
        store
            .put_file(&file, "a/b.mp4", "video/mp4", &metadata)
            .await
            .unwrap();

        assert_eq!(store.list_keys().await.unwrap(), vec!["a/b.mp4", "z/last.mp4"]);
        let obj = store.get("a/b.mp4").await.unwrap();
        assert_eq!(obj.data, b"video");
        assert_eq!(obj.content_type, "video/mp4");
        assert_eq!(store.head_metadata("a/b.mp4").await.unwrap(), metadata);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new("bucket");
        let err = store
            .put_file(&dir.path().join("gone.mp4"), "m/gone.mp4", "video/mp4", &ObjectMetadata::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::FileNotFound(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_head_missing_key() {
        let store = MemoryStore::new("bucket");
        assert!(matches!(
            store.head_metadata("m/x.mp4").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
