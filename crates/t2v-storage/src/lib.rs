//! Object storage for generated videos.
//!
//! This crate provides:
//! - An `ObjectStore` abstraction with S3 and in-memory implementations
//! - The blob uploader that pushes artifacts and removes local copies

pub mod client;
pub mod error;
pub mod memory;
pub mod store;
pub mod uploader;

pub use client::{S3Client, S3Config, DEFAULT_BUCKET, DEFAULT_REGION};
pub use error::{classify_provider_error, StorageError, StorageResult};
pub use memory::{MemoryStore, StoredObject};
pub use store::{ObjectMetadata, ObjectStore};
pub use uploader::{BlobUploader, UploadOutcome};
