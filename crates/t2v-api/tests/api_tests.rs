//! HTTP tests against the router with an in-memory bucket and a shell
//! script standing in for the generation program.

#![cfg(unix)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use t2v_api::{create_router, ApiConfig, AppState};
use t2v_generator::ModelRegistry;
use t2v_pipeline::{GenerationPipeline, PipelineConfig};
use t2v_storage::{MemoryStore, ObjectStore};

const GENERATE_SCRIPT: &str = r#"
save_dir=""
prompt_path=""
as_path=0
while [ $# -gt 0 ]; do
  case "$1" in
    --save-dir) save_dir="$2"; shift 2 ;;
    --prompt-path) prompt_path="$2"; shift 2 ;;
    --prompt-as-path) as_path=1; shift ;;
    *) shift ;;
  esac
done
n=0
while IFS= read -r line; do
  if [ $as_path -eq 1 ]; then
    printf 'video:%s' "$line" > "$save_dir/$line.mp4"
  else
    printf 'video:%s' "$line" > "$save_dir/sample_$n.mp4"
  fi
  n=$((n + 1))
done < "$prompt_path"
"#;

const FAILING_SCRIPT: &str = r#"
echo "RuntimeError: CUDA out of memory" >&2
exit 1
"#;

const SHORT_SCRIPT: &str = r#"
save_dir=""
while [ $# -gt 0 ]; do
  case "$1" in
    --save-dir) save_dir="$2"; shift 2 ;;
    *) shift ;;
  esac
done
printf 'only' > "$save_dir/sample_0.mp4"
"#;

struct TestApp {
    _dir: tempfile::TempDir,
    store: Arc<MemoryStore>,
    router: Router,
}

fn app_with(script_body: &str, models: &[&str]) -> TestApp {
    app_with_config(script_body, models, ApiConfig::default())
}

fn app_with_config(script_body: &str, models: &[&str], api_config: ApiConfig) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("inference.sh");
    std::fs::write(&script, script_body).unwrap();

    let config = PipelineConfig {
        output_dir: dir.path().join("out"),
        model_config_dir: dir.path().join("configs"),
        program: "sh".to_string(),
        script,
        ..Default::default()
    };
    let registry = ModelRegistry::from_entries(
        models
            .iter()
            .map(|m| (m.to_string(), dir.path().join(format!("configs/{m}.py")))),
    );

    let store = Arc::new(MemoryStore::new("text2videoviewer"));
    let pipeline = GenerationPipeline::new(config, registry, store.clone());
    let state = AppState::with_pipeline(api_config, pipeline);

    TestApp {
        _dir: dir,
        store,
        router: create_router(state, None),
    }
}

fn app(script_body: &str) -> TestApp {
    app_with(script_body, &["opensora-v1-2", "lambda-720p"])
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

async fn send_json(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send(router, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_generate_waterfall() {
    let app = app(GENERATE_SCRIPT);

    let (status, body) = send_json(
        &app.router,
        post_json(
            "/generate",
            json!({"model": "opensora-v1-2", "prompt": "a beautiful waterfall"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{
            "prompt": "a beautiful waterfall",
            "s3_path": "opensora-v1-2/a beautiful waterfall.mp4"
        }])
    );
    assert_eq!(
        app.store.list_keys().await.unwrap(),
        vec!["opensora-v1-2/a beautiful waterfall.mp4"]
    );
}

#[tokio::test]
async fn test_generate_prompt_list_with_base_prompts() {
    let app = app(GENERATE_SCRIPT);

    let (status, body) = send_json(
        &app.router,
        post_json(
            "/generate",
            json!({
                "model": "lambda-720p",
                "prompt": ["a red fox", {"prompt": "a fox at dusk", "base_prompt": "a red fox"}],
                "resolution": "720p",
                "aspect_ratio": "16:9",
                "num_frames": "4s"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let object = app.store.get("lambda-720p/a fox at dusk.mp4").await.unwrap();
    assert_eq!(
        object.metadata.get("base_prompt").map(String::as_str),
        Some("a red fox")
    );
}

#[tokio::test]
async fn test_unknown_model_is_rejected() {
    let app = app(GENERATE_SCRIPT);

    let (status, body) = send_json(
        &app.router,
        post_json("/generate", json!({"model": "sora-9000", "prompt": "a cat"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid request");
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("sora-9000"));
    assert!(error.contains("lambda-720p opensora-v1-2"));
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_failed_generation_returns_stderr() {
    let app = app(FAILING_SCRIPT);

    let (status, body) = send_json(
        &app.router,
        post_json(
            "/generate",
            json!({"model": "opensora-v1-2", "prompt": "a beautiful waterfall"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Video generation failed");
    assert!(body["error"].as_str().unwrap().contains("CUDA out of memory"));
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_positional_mismatch_fails_batch() {
    let app = app(SHORT_SCRIPT);

    let (status, body) = send_json(
        &app.router,
        post_json(
            "/generate",
            json!({
                "model": "opensora-v1-2",
                "prompt": ["first prompt", "second prompt"],
                "naming": "positional"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("Expected 2 generated files"));
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_malformed_bodies_are_bad_requests() {
    let app = app(GENERATE_SCRIPT);

    for body in [
        json!({"model": "opensora-v1-2", "prompt": "a cat", "seed": 3}),
        json!({"model": "opensora-v1-2"}),
        json!({"model": "opensora-v1-2", "prompt": "   "}),
        json!({"model": "opensora-v1-2", "prompt": "a cat", "resolution": "4k"}),
        json!({"model": "opensora-v1-2", "prompt": "x".repeat(501)}),
        json!({"model": "opensora-v1-2", "prompt": [{"prompt": "a cat", "base_promt": "typo"}]}),
        json!({"model": "opensora-v1-2", "prompt": [{"prompt": "a cat", "seed": 3}]}),
    ] {
        let (status, response) = send_json(&app.router, post_json("/generate", body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(response["message"], "Invalid request");
    }
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_repeated_prompt_is_rejected() {
    let app = app(GENERATE_SCRIPT);

    let (status, body) = send_json(
        &app.router,
        post_json("/generate", json!({"model": "opensora-v1-2", "prompt": ["a cat", "a cat"]})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid request");
    assert!(body["error"].as_str().unwrap().contains("repeats an earlier prompt"));
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_oversized_body_gets_json_error() {
    let config = ApiConfig {
        max_body_size: 64,
        ..ApiConfig::default()
    };
    let app = app_with_config(GENERATE_SCRIPT, &["opensora-v1-2"], config);

    let (status, headers, body) = send(
        &app.router,
        post_json("/generate", json!({"model": "opensora-v1-2", "prompt": "x".repeat(200)})),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["message"], "Request body too large");
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_download_returns_attachment() {
    let app = app(GENERATE_SCRIPT);

    let (status, headers, body) = send(
        &app.router,
        post_json(
            "/generate/download",
            json!({"model": "opensora-v1-2", "prompt": "a beautiful waterfall"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"a beautiful waterfall.mp4\""
    );
    assert_eq!(body, b"video:a beautiful waterfall");
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_health_and_ready() {
    let app = app(GENERATE_SCRIPT);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send_json(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let request = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    let (status, body) = send_json(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["storage"]["status"], "ok");
}

#[tokio::test]
async fn test_not_ready_without_models() {
    let app = app_with(GENERATE_SCRIPT, &[]);

    let request = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    let (status, body) = send_json(&app.router, request).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["models"]["status"], "error");
}

#[tokio::test]
async fn test_request_id_and_security_headers() {
    let app = app(GENERATE_SCRIPT);

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(&app.router, request).await;

    assert_eq!(headers["x-request-id"], "req-42");
    assert_eq!(headers["x-content-type-options"], "nosniff");
}
