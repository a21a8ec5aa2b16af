use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::{
    auth::CallerIdentity,
    error::ApiResult,
    response::{no_content, success},
    routes::AppState,
};

/// 排班变更请求
#[derive(Debug, Deserialize)]
pub struct DutyRequest {
    pub on_duty: bool,
}

/// 手工调整轮转位次请求
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub order: i64,
}

/// 设备token请求
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

/// 上下班切换
pub async fn set_duty(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<String>,
    Json(request): Json<DutyRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let outcome = state.reactors.set_duty(&caller, &id, request.on_duty).await?;
    Ok(success(outcome))
}

/// 管理人员手工调整轮转位次
pub async fn reorder_closer(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<String>,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    state.reactors.reorder_closer(&caller, &id, request.order).await?;
    Ok(no_content())
}

/// 注册推送设备token
pub async fn register_token(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<String>,
    Json(request): Json<TokenRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    state
        .reactors
        .register_token(&caller, &id, &request.token)
        .await?;
    Ok(no_content())
}

/// 注销推送设备token
pub async fn remove_token(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<String>,
    Json(request): Json<TokenRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    state
        .reactors
        .remove_token(&caller, &id, &request.token)
        .await?;
    Ok(no_content())
}
