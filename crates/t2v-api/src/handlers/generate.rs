//! Generation handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use t2v_models::{GenerationRequest, GenerationRequestBody};
use t2v_pipeline::RunLogger;
use t2v_storage::UploadOutcome;

use crate::error::{ApiError, ApiResult};
use crate::middleware::RequestId;
use crate::state::AppState;

fn parse_request(body: Result<Json<GenerationRequestBody>, JsonRejection>) -> ApiResult<GenerationRequest> {
    let Json(body) = body.map_err(ApiError::from_rejection)?;
    Ok(GenerationRequest::try_from(body)?)
}

fn run_logger(request_id: Option<Extension<RequestId>>, model: &str, operation: &str) -> RunLogger {
    match request_id {
        Some(Extension(RequestId(id))) => RunLogger::with_id(&id, model, operation),
        None => RunLogger::new(model, operation),
    }
}

/// Generate videos for the given prompts and upload them.
///
/// Responds with one entry per prompt: `{prompt, s3_path}` on success,
/// `{prompt, error}` when that prompt's upload failed.
pub async fn generate(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    body: Result<Json<GenerationRequestBody>, JsonRejection>,
) -> ApiResult<Json<Vec<UploadOutcome>>> {
    let request = parse_request(body)?;
    let logger = run_logger(request_id, request.model(), "generate");

    let outcome = state.pipeline.run_logged(request, &logger).await?;
    Ok(Json(outcome.results))
}

/// Generate a single video and return it as an attachment.
pub async fn generate_download(
    State(state): State<AppState>,
    body: Result<Json<GenerationRequestBody>, JsonRejection>,
) -> ApiResult<Response> {
    let request = parse_request(body)?;
    let video = state.pipeline.generate_file(request).await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        header_safe_file_name(&video.file_name)
    );

    Ok((
        [
            (header::CONTENT_TYPE, video.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        video.data,
    )
        .into_response())
}

/// Replace characters that cannot appear in a quoted header parameter.
fn header_safe_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_safe_file_name() {
        assert_eq!(header_safe_file_name("a beautiful waterfall.mp4"), "a beautiful waterfall.mp4");
        assert_eq!(header_safe_file_name("café.mp4"), "caf_.mp4");
    }
}
