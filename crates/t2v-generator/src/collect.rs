//! Matching generated files back to prompts.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use t2v_models::{trim_prompt, Artifact, ArtifactNaming, GenerationRequest, GenerationResult};

use crate::error::{GeneratorError, GeneratorResult};
use crate::fs_utils::list_outputs;

/// Scans the output directory after a successful run.
#[derive(Debug, Clone)]
pub struct ArtifactCollector {
    output_dir: PathBuf,
    extension: String,
}

impl ArtifactCollector {
    pub fn new(output_dir: impl AsRef<Path>, extension: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            extension: extension.into(),
        }
    }

    /// Collect artifacts for `request` using the given naming policy.
    pub async fn collect(
        &self,
        result: &GenerationResult,
        request: &GenerationRequest,
        naming: ArtifactNaming,
    ) -> GeneratorResult<Vec<Artifact>> {
        if !result.is_success() {
            return Err(GeneratorError::invocation(format!(
                "refusing to collect after failed generation (exit code {:?})",
                result.exit_code
            )));
        }

        let files = list_outputs(&self.output_dir, &self.extension).await?;
        debug!(
            files = files.len(),
            prompts = request.prompts().len(),
            naming = %naming,
            "Collecting generated files"
        );

        match naming {
            ArtifactNaming::Positional => {
                let expected = request.prompts().len();
                retain_all_positional(retain_existing(positional(files, request)?), expected)
            }
            ArtifactNaming::PromptAsPath => {
                if files.len() != request.prompts().len() {
                    warn!(
                        "Found {} generated files for {} prompts",
                        files.len(),
                        request.prompts().len()
                    );
                }
                let artifacts =
                    prompt_as_path(files, request.model(), |prompt| request.base_prompt_for(prompt));
                Ok(retain_existing(artifacts))
            }
        }
    }

    /// Collect files already named after their prompts, without a request.
    pub async fn collect_existing(&self, model: &str) -> GeneratorResult<Vec<Artifact>> {
        let files = list_outputs(&self.output_dir, &self.extension).await?;
        Ok(retain_existing(prompt_as_path(files, model, |_| String::new())))
    }
}

/// Nth prompt to Nth file; the counts must agree.
fn positional(files: Vec<PathBuf>, request: &GenerationRequest) -> GeneratorResult<Vec<Artifact>> {
    let prompts = request.prompts();
    if files.len() != prompts.len() {
        return Err(GeneratorError::ArtifactMismatch {
            expected: prompts.len(),
            found: files.len(),
        });
    }

    Ok(files
        .into_iter()
        .zip(prompts)
        .map(|(path, entry)| Artifact::new(path, &entry.prompt, &entry.base_prompt, request.model()))
        .collect())
}

/// Prompt read back from each file stem.
fn prompt_as_path<F>(files: Vec<PathBuf>, model: &str, base_prompt_for: F) -> Vec<Artifact>
where
    F: Fn(&str) -> String,
{
    files
        .into_iter()
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?;
            let prompt = trim_prompt(stem);
            if prompt.is_empty() {
                warn!("Skipping file with empty prompt name: {}", path.display());
                return None;
            }
            let base_prompt = base_prompt_for(&prompt);
            Some(Artifact::new(path, prompt, base_prompt, model))
        })
        .collect()
}

/// Positional batches are all-or-nothing, also after [`retain_existing`].
fn retain_all_positional(artifacts: Vec<Artifact>, expected: usize) -> GeneratorResult<Vec<Artifact>> {
    if artifacts.len() != expected {
        return Err(GeneratorError::ArtifactMismatch {
            expected,
            found: artifacts.len(),
        });
    }
    Ok(artifacts)
}

/// Drop artifacts whose file vanished since listing.
fn retain_existing(artifacts: Vec<Artifact>) -> Vec<Artifact> {
    artifacts
        .into_iter()
        .filter(|a| {
            let exists = a.path().is_file();
            if !exists {
                warn!("Generated file disappeared before collection: {}", a.path().display());
            }
            exists
        })
        .collect()
}
