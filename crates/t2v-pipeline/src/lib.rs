//! Text-to-video generate, upload and catalog pipeline.
//!
//! This crate ties the generator and storage crates together:
//! - `GenerationPipeline` runs one request end to end
//! - `CatalogRebuilder` regenerates the viewer catalog from the bucket
//! - prompt file validation for operators
//!
//! Binaries under `src/bin` expose these as command-line tools.

pub mod catalog;
pub mod config;
pub mod error;
pub mod fs_utils;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod prompt_files;

pub use catalog::{
    render_catalog, select_records, ApprovedPrompts, CatalogEntry, CatalogRebuilder, CatalogReport,
    CatalogSelection,
};
pub use config::{CatalogConfig, PipelineConfig, DEFAULT_CATALOG_MODELS, DEFAULT_LEGACY_ALIASES};
pub use error::{PipelineError, PipelineResult};
pub use logging::{init_tracing, RunLogger};
pub use pipeline::{GeneratedVideo, GenerationPipeline, PipelineOutcome};
pub use prompt_files::{read_prompt_file, validate_prompt_file, PROMPT_LIST_FILE_NAME};
