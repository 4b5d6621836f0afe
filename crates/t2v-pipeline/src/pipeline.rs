//! Generate-collect-upload pipeline.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Mutex;

use t2v_generator::{ArtifactCollector, Invoker, ModelRegistry, ResolvedModel};
use t2v_models::{Artifact, ArtifactNaming, GenerationRequest, GenerationResult, ValidationError};
use t2v_storage::{BlobUploader, ObjectStore, UploadOutcome};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::RunLogger;
use crate::metrics;

/// Per-prompt results of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineOutcome {
    pub run_id: String,
    pub model: String,
    pub results: Vec<UploadOutcome>,
}

impl PipelineOutcome {
    pub fn uploaded(&self) -> usize {
        self.results.iter().filter(|r| r.is_uploaded()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.uploaded()
    }
}

/// A generated video read back into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVideo {
    pub prompt: String,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Runs generation requests against one output directory.
///
/// Every run clears and rescans the output directory, so runs are
/// serialized through an internal lock.
pub struct GenerationPipeline {
    config: PipelineConfig,
    registry: ModelRegistry,
    invoker: Invoker,
    collector: ArtifactCollector,
    uploader: BlobUploader,
    run_lock: Mutex<()>,
}

impl GenerationPipeline {
    pub fn new(config: PipelineConfig, registry: ModelRegistry, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            invoker: Invoker::new(config.invoker_settings()),
            collector: ArtifactCollector::new(&config.output_dir, config.extension.clone()),
            uploader: BlobUploader::new(store),
            registry,
            config,
            run_lock: Mutex::new(()),
        }
    }

    /// Build a pipeline whose registry is discovered from the config directory.
    pub fn from_config(config: PipelineConfig, store: Arc<dyn ObjectStore>) -> PipelineResult<Self> {
        let registry = ModelRegistry::discover(&config.model_config_dir)?;
        Ok(Self::new(config, registry, store))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        self.uploader.store()
    }

    /// Resolve the model and naming policy for a request.
    fn prepare(&self, request: &GenerationRequest) -> PipelineResult<(ResolvedModel, ArtifactNaming)> {
        let model = self.registry.resolve(request.model())?;
        let naming = request.naming().unwrap_or(self.config.naming);
        Ok((model, naming))
    }

    /// Run the generation program; a non-zero exit becomes `GenerationFailed`.
    async fn generate(
        &self,
        request: &GenerationRequest,
        model: &ResolvedModel,
        naming: ArtifactNaming,
        logger: &RunLogger,
    ) -> PipelineResult<GenerationResult> {
        let started = Instant::now();
        let result = match self.invoker.invoke(request, model, naming).await {
            Ok(result) => result,
            Err(e) => {
                metrics::record_generation(&model.name, "launch_failed", started.elapsed().as_secs_f64());
                logger.log_error(&e.to_string());
                return Err(e.into());
            }
        };

        let elapsed = started.elapsed().as_secs_f64();
        if !result.is_success() {
            metrics::record_generation(&model.name, "failed", elapsed);
            logger.log_error(&format!("generation exited with {:?}: {}", result.exit_code, result.stderr));
            return Err(PipelineError::GenerationFailed {
                exit_code: result.exit_code,
                stderr: result.stderr,
            });
        }

        metrics::record_generation(&model.name, "success", elapsed);
        logger.log_progress(&format!("generation finished in {:.1}s", elapsed));
        Ok(result)
    }

    /// Generate, collect and upload videos for a request.
    pub async fn run(&self, request: GenerationRequest) -> PipelineResult<PipelineOutcome> {
        let logger = RunLogger::new(request.model(), "generate");
        self.run_logged(request, &logger).await
    }

    /// [`run`](Self::run) with a caller-provided logger.
    pub async fn run_logged(
        &self,
        request: GenerationRequest,
        logger: &RunLogger,
    ) -> PipelineResult<PipelineOutcome> {
        let (model, naming) = self.prepare(&request)?;

        let _guard = self.run_lock.lock().await;
        logger.log_start(&format!("{} prompts, naming {}", request.prompts().len(), naming));

        let result = self.generate(&request, &model, naming, logger).await?;
        let artifacts = self.collector.collect(&result, &request, naming).await?;
        let missing = missing_prompts(&request, &artifacts);

        let mut results = self.uploader.upload_batch(artifacts).await?;
        metrics::record_uploads(&model.name, &results);

        for prompt in missing {
            logger.log_warning(&format!("no video generated for prompt: {}", prompt));
            results.push(UploadOutcome::Failed {
                prompt,
                error: PipelineError::NoOutput.to_string(),
            });
        }

        let outcome = PipelineOutcome {
            run_id: logger.run_id().to_string(),
            model: model.name,
            results,
        };
        logger.log_completion(&format!(
            "{} uploaded, {} failed",
            outcome.uploaded(),
            outcome.failed()
        ));
        Ok(outcome)
    }

    /// Upload videos already in the output directory, named after their prompts.
    pub async fn export_existing(&self, model: &str) -> PipelineResult<PipelineOutcome> {
        let model = model.trim();
        if model.is_empty() {
            return Err(ValidationError::InvalidField("model must not be empty".to_string()).into());
        }

        let logger = RunLogger::new(model, "export");
        let _guard = self.run_lock.lock().await;

        let artifacts = self.collector.collect_existing(model).await?;
        logger.log_start(&format!("exporting {} existing videos", artifacts.len()));

        let results = self.uploader.upload_batch(artifacts).await?;
        metrics::record_uploads(model, &results);

        let outcome = PipelineOutcome {
            run_id: logger.run_id().to_string(),
            model: model.to_string(),
            results,
        };
        logger.log_completion(&format!(
            "{} uploaded, {} failed",
            outcome.uploaded(),
            outcome.failed()
        ));
        Ok(outcome)
    }

    /// Generate a single video and return its bytes without uploading it.
    ///
    /// The local file is removed once read.
    pub async fn generate_file(&self, request: GenerationRequest) -> PipelineResult<GeneratedVideo> {
        if request.prompts().len() != 1 {
            return Err(ValidationError::InvalidField(
                "download requires exactly one prompt".to_string(),
            )
            .into());
        }

        let (model, naming) = self.prepare(&request)?;
        let logger = RunLogger::new(&model.name, "download");

        let _guard = self.run_lock.lock().await;
        logger.log_start("single prompt");

        let result = self.generate(&request, &model, naming, &logger).await?;
        let artifact = self
            .collector
            .collect(&result, &request, naming)
            .await?
            .into_iter()
            .next()
            .ok_or(PipelineError::NoOutput)?;

        let data = tokio::fs::read(artifact.path()).await?;
        if let Err(e) = tokio::fs::remove_file(artifact.path()).await {
            logger.log_warning(&format!("failed to remove {}: {}", artifact.path().display(), e));
        }

        let file_name = artifact
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.{}", artifact.prompt, artifact.extension()));

        logger.log_completion(&format!("{} bytes", data.len()));
        Ok(GeneratedVideo {
            content_type: artifact.content_type().to_string(),
            prompt: artifact.prompt,
            file_name,
            data,
        })
    }
}

/// Requested prompts with no collected artifact, in request order.
fn missing_prompts(request: &GenerationRequest, artifacts: &[Artifact]) -> Vec<String> {
    request
        .prompts()
        .iter()
        .filter(|entry| !artifacts.iter().any(|a| a.prompt == entry.prompt))
        .map(|entry| entry.prompt.clone())
        .collect()
}
