//! Catalog records.

use serde::{Deserialize, Serialize};

/// One row of the viewer catalog.
///
/// Derived from an object key plus optional object metadata; the bucket is
/// the only source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub model: String,
    pub prompt: String,
    #[serde(default)]
    pub base_prompt: String,
    pub object_name: String,
}

impl CatalogRecord {
    pub fn new(
        model: impl Into<String>,
        prompt: impl Into<String>,
        object_name: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            base_prompt: String::new(),
            object_name: object_name.into(),
        }
    }
}

/// Column order of the catalog file.
pub const CATALOG_HEADER: [&str; 3] = ["model", "prompt", "object_name"];

/// Optional trailing column.
pub const CATALOG_BASE_PROMPT_COLUMN: &str = "base_prompt";
