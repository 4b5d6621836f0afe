//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; the API installs the Prometheus
//! recorder, CLIs run without one and these calls become no-ops.

use metrics::{counter, histogram};

use t2v_storage::UploadOutcome;

/// Metric names as constants for consistency.
pub mod names {
    pub const GENERATIONS_TOTAL: &str = "t2v_generations_total";
    pub const GENERATION_DURATION_SECONDS: &str = "t2v_generation_duration_seconds";
    pub const UPLOADS_TOTAL: &str = "t2v_uploads_total";
    pub const CATALOG_ROWS: &str = "t2v_catalog_rows_total";
}

/// Record one generation run.
pub fn record_generation(model: &str, status: &str, duration_secs: f64) {
    let labels = [("model", model.to_string()), ("status", status.to_string())];
    counter!(names::GENERATIONS_TOTAL, &labels).increment(1);
    histogram!(names::GENERATION_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record per-artifact upload outcomes.
pub fn record_uploads(model: &str, outcomes: &[UploadOutcome]) {
    for outcome in outcomes {
        let status = if outcome.is_uploaded() { "uploaded" } else { "failed" };
        let labels = [("model", model.to_string()), ("status", status.to_string())];
        counter!(names::UPLOADS_TOTAL, &labels).increment(1);
    }
}

/// Record rows written by a catalog rebuild.
pub fn record_catalog_rows(rows: usize) {
    counter!(names::CATALOG_ROWS).increment(rows as u64);
}
