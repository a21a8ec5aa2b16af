use axum::{extract::State, http::StatusCode};

use crate::routes::AppState;

/// Prometheus文本格式的指标导出
pub async fn export_metrics(State(state): State<AppState>) -> (StatusCode, String) {
    match &state.metrics_handle {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics disabled\n".to_string()),
    }
}
