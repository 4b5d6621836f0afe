//! Pipeline error types.

use thiserror::Error;

use t2v_generator::GeneratorError;
use t2v_models::ValidationError;
use t2v_storage::StorageError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid prompts: {0}")]
    Validation(#[from] ValidationError),

    #[error("Generation failed with exit code {exit_code:?}")]
    GenerationFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("No video was generated for the request")]
    NoOutput,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Generator error: {0}")]
    Generator(#[from] GeneratorError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether the caller sent a bad request rather than hitting a server fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Generator(GeneratorError::UnknownModel { .. })
        )
    }

    /// Detail string shown to callers: captured stderr for generation
    /// failures, the error message otherwise.
    pub fn detail(&self) -> String {
        match self {
            Self::GenerationFailed { stderr, .. } => stderr.clone(),
            other => other.to_string(),
        }
    }
}
