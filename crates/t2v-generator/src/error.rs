//! Error types for generation operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for generation operations.
pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Errors that can occur while invoking the generation program or
/// collecting its output.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Invalid model: {model}; should be in {}", .accepted.join(" "))]
    UnknownModel { model: String, accepted: Vec<String> },

    #[error("Failed to launch generation process: {message}")]
    Invocation { message: String },

    #[error("Expected {expected} generated files, found {found}")]
    ArtifactMismatch { expected: usize, found: usize },

    #[error("Model config directory not readable: {0}")]
    RegistryUnavailable(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeneratorError {
    pub fn invocation(message: impl Into<String>) -> Self {
        Self::Invocation {
            message: message.into(),
        }
    }

    pub fn unknown_model(model: impl Into<String>, accepted: Vec<String>) -> Self {
        Self::UnknownModel {
            model: model.into(),
            accepted,
        }
    }
}
