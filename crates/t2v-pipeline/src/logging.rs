//! Tracing setup and structured run logging.

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Initialize tracing: JSON when `LOG_FORMAT=json`, coloured text otherwise.
///
/// `RUST_LOG` is honoured; the `t2v` crates default to `info`.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,t2v_models=info,t2v_generator=info,t2v_storage=info,t2v_pipeline=info")
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if use_json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .try_init()
    };

    // A subscriber is already installed when called twice (tests, embedding).
    result.ok();
}

/// Run logger carrying request id and model through one pipeline run.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    model: String,
    operation: String,
}

impl RunLogger {
    pub fn new(model: &str, operation: &str) -> Self {
        Self::with_id(&Uuid::new_v4().to_string(), model, operation)
    }

    /// Reuse an id assigned upstream (for example the HTTP request id).
    pub fn with_id(run_id: &str, model: &str, operation: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            model: model.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            model = %self.model,
            operation = %self.operation,
            "Run started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            model = %self.model,
            operation = %self.operation,
            "Run progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            model = %self.model,
            operation = %self.operation,
            "Run warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            model = %self.model,
            operation = %self.operation,
            "Run error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            model = %self.model,
            operation = %self.operation,
            "Run completed: {}", message
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_logger_generates_id() {
        let a = RunLogger::new("opensora-v1-2", "generate");
        let b = RunLogger::new("opensora-v1-2", "generate");
        assert_ne!(a.run_id(), b.run_id());
        assert_eq!(a.model(), "opensora-v1-2");
    }

    #[test]
    fn test_run_logger_with_id() {
        let logger = RunLogger::with_id("req-123", "lambda-720p", "export");
        assert_eq!(logger.run_id(), "req-123");
    }
}
