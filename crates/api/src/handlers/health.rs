use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::routes::AppState;

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let (status_code, database) = match state.database.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
    };

    (
        status_code,
        Json(json!({
            "status": if status_code == StatusCode::OK { "ok" } else { "degraded" },
            "database": database,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "service": "lineup",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}
