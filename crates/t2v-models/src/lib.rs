//! Shared data models for the text-to-video backend.
//!
//! This crate provides:
//! - Generation requests and their validated parameters
//! - Prompt cleaning and validation
//! - Artifacts and generation results
//! - Catalog records and the object-key codec

pub mod artifact;
pub mod catalog;
pub mod object_key;
pub mod prompt;
pub mod request;

// Re-export common types
pub use artifact::{Artifact, GenerationResult};
pub use catalog::{CatalogRecord, CATALOG_BASE_PROMPT_COLUMN, CATALOG_HEADER};
pub use object_key::{decode_object_key, encode_object_key};
pub use prompt::{
    clean_prompt, is_normalized, normalize_prompts, trim_prompt, PromptEntry, ValidationError,
    ValidationResult, MAX_PROMPT_LEN, MAX_TABLE_PROMPT_LEN,
};
pub use request::{
    ArtifactNaming, AspectRatio, GenerationParams, GenerationRequest, GenerationRequestBody,
    NumFrames, PromptInput, PromptItem, PromptObject, Resolution,
};
