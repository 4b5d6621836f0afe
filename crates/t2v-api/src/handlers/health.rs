//! Liveness and readiness checks.

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

/// Liveness check. Never touches the bucket or the generator.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Ok,
    Error,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: CheckState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl CheckResult {
    fn passed(detail: Option<String>, latency_ms: Option<u64>) -> Self {
        Self {
            status: CheckState::Ok,
            detail,
            error: None,
            latency_ms,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            status: CheckState::Error,
            detail: None,
            error: Some(error.into()),
            latency_ms: None,
        }
    }
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub storage: CheckResult,
    pub models: CheckResult,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub checks: ReadinessChecks,
}

async fn check_storage(state: &AppState) -> CheckResult {
    let store = state.pipeline.store();
    let started = Instant::now();
    match store.check_connectivity().await {
        Ok(()) => CheckResult::passed(
            Some(store.bucket().to_string()),
            Some(started.elapsed().as_millis() as u64),
        ),
        Err(e) => CheckResult::failed(e.to_string()),
    }
}

fn check_models(state: &AppState) -> CheckResult {
    let registry = state.pipeline.registry();
    if registry.is_empty() {
        return CheckResult::failed("no model configs registered");
    }
    CheckResult::passed(Some(registry.names().join(" ")), None)
}

/// Readiness check: bucket reachable and at least one model registered.
/// Answers 503 with the same body when degraded.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let checks = ReadinessChecks {
        storage: check_storage(&state).await,
        models: check_models(&state),
    };

    let ready = checks.storage.status == CheckState::Ok && checks.models.status == CheckState::Ok;
    let (code, status) = if ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (code, Json(ReadinessResponse { status, checks }))
}
