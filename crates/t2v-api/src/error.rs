//! API error types.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use t2v_models::ValidationError;
use t2v_pipeline::PipelineError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
}

impl ApiError {
    /// Map a JSON extractor rejection, keeping the body-limit status.
    pub fn from_rejection(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(rejection.body_text())
        } else {
            Self::BadRequest(rejection.body_text())
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Pipeline(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short summary for the `message` field.
    fn message(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => "Invalid request",
            ApiError::PayloadTooLarge(_) => "Request body too large",
            ApiError::Pipeline(e) if e.is_client_error() => "Invalid request",
            ApiError::Pipeline(PipelineError::GenerationFailed { .. }) => "Video generation failed",
            ApiError::Pipeline(_) => "Internal server error",
        }
    }

    /// Detail for the `error` field.
    fn detail(&self) -> String {
        match self {
            ApiError::BadRequest(msg) | ApiError::PayloadTooLarge(msg) => msg.clone(),
            ApiError::Validation(e) => e.to_string(),
            ApiError::Pipeline(e) => e.detail(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = self.detail();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %detail, "request failed");
        } else {
            tracing::debug!(status = %status, error = %detail, "request rejected");
        }

        let body = ErrorResponse {
            message: self.message().to_string(),
            error: detail,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use t2v_generator::GeneratorError;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::from(ValidationError::NoPrompts).status_code(),
            StatusCode::BAD_REQUEST
        );

        let unknown: PipelineError =
            GeneratorError::unknown_model("x", vec!["opensora-v1-2".to_string()]).into();
        assert_eq!(ApiError::from(unknown).status_code(), StatusCode::BAD_REQUEST);

        let failed = PipelineError::GenerationFailed {
            exit_code: Some(1),
            stderr: "boom".to_string(),
        };
        let err = ApiError::from(failed);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail(), "boom");
        assert_eq!(err.message(), "Video generation failed");
        let too_large = ApiError::PayloadTooLarge("length limit exceeded".to_string());
        assert_eq!(too_large.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(too_large.message(), "Request body too large");
    }
}
