//! Application state.

use std::sync::Arc;

use t2v_pipeline::{GenerationPipeline, PipelineConfig, PipelineResult};
use t2v_storage::S3Client;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<GenerationPipeline>,
}

impl AppState {
    /// Create application state from the environment.
    pub async fn new(config: ApiConfig) -> PipelineResult<Self> {
        let storage = Arc::new(S3Client::from_env().await?);
        let pipeline = GenerationPipeline::from_config(PipelineConfig::from_env(), storage)?;
        Ok(Self::with_pipeline(config, pipeline))
    }

    pub fn with_pipeline(config: ApiConfig, pipeline: GenerationPipeline) -> Self {
        Self {
            config,
            pipeline: Arc::new(pipeline),
        }
    }
}
