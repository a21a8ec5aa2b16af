use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use lineup_dispatcher::EventReactors;
use lineup_infrastructure::DatabaseManager;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{
    closers::{register_token, remove_token, reorder_closer, set_duty},
    health::health_check,
    leads::{
        accept_job, create_lead, get_lead, manual_assign, record_disposition, reschedule,
        self_assign, verify_lead,
    },
    metrics::export_metrics,
    teams::{get_team_activity, get_team_lineup, get_team_stats},
};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub reactors: Arc<EventReactors>,
    pub database: Arc<DatabaseManager>,
    /// Prometheus文本导出, 未启用指标时为None
    pub metrics_handle: Option<PrometheusHandle>,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // 健康与指标
        .route("/health", get(health_check))
        .route("/metrics", get(export_metrics))
        // 线索生命周期
        .route("/api/leads", post(create_lead))
        .route("/api/leads/{id}", get(get_lead))
        .route("/api/leads/{id}/verify", post(verify_lead))
        .route("/api/leads/{id}/assign", post(manual_assign))
        .route("/api/leads/{id}/accept", post(accept_job))
        .route("/api/leads/{id}/self-assign", post(self_assign))
        .route("/api/leads/{id}/disposition", post(record_disposition))
        .route("/api/leads/{id}/schedule", post(reschedule))
        // closer排班与设备
        .route("/api/closers/{id}/duty", post(set_duty))
        .route("/api/closers/{id}/reorder", post(reorder_closer))
        .route("/api/closers/{id}/tokens", post(register_token))
        .route("/api/closers/{id}/tokens/remove", post(remove_token))
        // 团队视图
        .route("/api/teams/{id}/stats", get(get_team_stats))
        .route("/api/teams/{id}/lineup", get(get_team_lineup))
        .route("/api/teams/{id}/activity", get(get_team_activity))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
