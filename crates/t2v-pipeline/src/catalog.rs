//! Catalog rebuilder.
//!
//! The viewer catalog is derived entirely from the bucket: every object key
//! that decodes to `(model, prompt)` and passes the filters becomes one row.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use t2v_models::{decode_object_key, CatalogRecord, PromptEntry, CATALOG_BASE_PROMPT_COLUMN, CATALOG_HEADER};
use t2v_storage::ObjectStore;

use crate::config::CatalogConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::fs_utils::write_atomic;
use crate::metrics;
use crate::prompt_files::read_prompt_file;

/// Approved prompts with their base prompts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovedPrompts {
    entries: HashMap<String, String>,
}

impl ApprovedPrompts {
    pub fn from_entries(entries: impl IntoIterator<Item = PromptEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| (e.prompt, e.base_prompt))
                .collect(),
        }
    }

    /// Load a `.csv` or `.txt` prompt file.
    pub async fn load(path: impl AsRef<Path>) -> PipelineResult<Self> {
        Ok(Self::from_entries(read_prompt_file(path).await?))
    }

    pub fn base_prompt(&self, prompt: &str) -> Option<&str> {
        self.entries.get(prompt).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A catalog row still tied to the object it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub key: String,
    pub record: CatalogRecord,
}

/// Result of filtering bucket keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSelection {
    pub entries: Vec<CatalogEntry>,
    /// Keys that do not decode to `(model, prompt)`
    pub skipped_keys: usize,
    /// Objects of models outside the allowlist
    pub filtered_models: usize,
    /// Prompts missing from the approved table, first-seen order
    pub dropped_prompts: Vec<String>,
}

/// Summary of one rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogReport {
    pub path: PathBuf,
    pub rows: usize,
    pub skipped_keys: usize,
    pub filtered_models: usize,
    pub dropped_prompts: Vec<String>,
}

/// Decode and filter bucket keys into catalog entries, keeping listing order.
pub fn select_records(
    keys: &[String],
    models: &[String],
    approved: Option<&ApprovedPrompts>,
    aliases: &BTreeMap<String, String>,
) -> CatalogSelection {
    let mut selection = CatalogSelection::default();

    for key in keys {
        let Some((model, prompt)) = decode_object_key(key) else {
            debug!("Skipping object with unrecognized key: {}", key);
            selection.skipped_keys += 1;
            continue;
        };

        if !models.iter().any(|m| *m == model) {
            selection.filtered_models += 1;
            continue;
        }

        let mut record = CatalogRecord::new(
            aliases.get(&model).cloned().unwrap_or(model),
            prompt,
            key.clone(),
        );

        if let Some(approved) = approved {
            match approved.base_prompt(&record.prompt) {
                Some(base) => record.base_prompt = base.to_string(),
                None => {
                    if !selection.dropped_prompts.contains(&record.prompt) {
                        selection.dropped_prompts.push(record.prompt.clone());
                    }
                    continue;
                }
            }
        }

        selection.entries.push(CatalogEntry {
            key: key.clone(),
            record,
        });
    }

    selection
}

/// Serialize catalog rows; every field is quoted.
pub fn render_catalog(records: &[CatalogRecord], with_base_prompt: bool) -> PipelineResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    let mut header: Vec<&str> = CATALOG_HEADER.to_vec();
    if with_base_prompt {
        header.push(CATALOG_BASE_PROMPT_COLUMN);
    }
    writer.write_record(&header)?;

    for record in records {
        let mut row = vec![
            record.model.as_str(),
            record.prompt.as_str(),
            record.object_name.as_str(),
        ];
        if with_base_prompt {
            row.push(record.base_prompt.as_str());
        }
        writer.write_record(&row)?;
    }

    writer.into_inner().map_err(|e| PipelineError::Io(e.into_error()))
}

/// Rebuilds the viewer catalog from the bucket contents.
pub struct CatalogRebuilder {
    store: Arc<dyn ObjectStore>,
    config: CatalogConfig,
}

impl CatalogRebuilder {
    pub fn new(store: Arc<dyn ObjectStore>, config: CatalogConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    async fn approved_prompts(&self) -> PipelineResult<Option<ApprovedPrompts>> {
        match &self.config.approved_prompts {
            Some(path) => {
                let approved = ApprovedPrompts::load(path).await?;
                info!("Loaded {} approved prompts from {}", approved.len(), path.display());
                Ok(Some(approved))
            }
            None => Ok(None),
        }
    }

    /// Collect catalog rows without writing them.
    pub async fn collect(&self) -> PipelineResult<CatalogSelection> {
        let keys = self.store.list_keys().await?;
        info!(bucket = self.store.bucket(), objects = keys.len(), "Listed bucket");

        let approved = self.approved_prompts().await?;
        let mut selection = select_records(
            &keys,
            &self.config.models,
            approved.as_ref(),
            &self.config.aliases,
        );

        if self.config.fetch_metadata {
            for entry in &mut selection.entries {
                match self.store.head_metadata(&entry.key).await {
                    Ok(metadata) => {
                        if let Some(base) = metadata.get(CATALOG_BASE_PROMPT_COLUMN) {
                            entry.record.base_prompt = base.clone();
                        }
                    }
                    Err(e) => warn!(key = %entry.key, error = %e, "Failed to read object metadata"),
                }
            }
        }

        for prompt in &selection.dropped_prompts {
            warn!("Prompt not in approved list, left out of catalog: {}", prompt);
        }

        Ok(selection)
    }

    /// Rebuild the catalog file.
    pub async fn rebuild(&self) -> PipelineResult<CatalogReport> {
        let selection = self.collect().await?;
        let records: Vec<CatalogRecord> = selection.entries.into_iter().map(|e| e.record).collect();

        let with_base_prompt = self.config.fetch_metadata || self.config.approved_prompts.is_some();
        let bytes = render_catalog(&records, with_base_prompt)?;
        write_atomic(&self.config.output_path, &bytes).await?;

        metrics::record_catalog_rows(records.len());
        info!(
            rows = records.len(),
            skipped = selection.skipped_keys,
            filtered = selection.filtered_models,
            dropped = selection.dropped_prompts.len(),
            "Catalog written to {}",
            self.config.output_path.display()
        );

        Ok(CatalogReport {
            path: self.config.output_path.clone(),
            rows: records.len(),
            skipped_keys: selection.skipped_keys,
            filtered_models: selection.filtered_models,
            dropped_prompts: selection.dropped_prompts,
        })
    }
}
