use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use lineup_core::DispatchError;
use lineup_domain::{LeadDraft, LeadStatus};

use crate::{
    auth::CallerIdentity,
    error::ApiResult,
    response::{created, success},
    routes::AppState,
};

/// 手工指派请求
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub closer_id: String,
}

/// 处置结果请求
#[derive(Debug, Deserialize)]
pub struct DispositionRequest {
    pub disposition: LeadStatus,
}

/// 改约请求
#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub scheduled_time: DateTime<Utc>,
}

/// 创建线索并立即尝试派发
pub async fn create_lead(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Json(draft): Json<LeadDraft>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let outcome = state.reactors.create_lead(&caller, draft).await?;
    Ok(created(outcome))
}

/// 查询单条线索
pub async fn get_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let lead = state
        .database
        .lead_repository()
        .get_by_id(&id)
        .await?
        .ok_or(DispatchError::LeadNotFound { id })?;
    Ok(success(lead))
}

/// 核验预约线索
pub async fn verify_lead(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<String>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let lead = state.reactors.verify_lead(&caller, &id).await?;
    Ok(success(lead))
}

/// 管理人员手工指派
pub async fn manual_assign(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<String>,
    Json(request): Json<AssignRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let lead = state
        .reactors
        .manual_assign(&caller, &id, &request.closer_id)
        .await?;
    Ok(success(lead))
}

/// closer接单
pub async fn accept_job(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<String>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let outcome = state.reactors.accept_job(&caller, &id).await?;
    Ok(success(outcome))
}

/// closer自主认领无主线索
pub async fn self_assign(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<String>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let lead = state.reactors.self_assign(&caller, &id).await?;
    Ok(success(lead))
}

/// 记录处置结果, 驱动轮转
pub async fn record_disposition(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<String>,
    Json(request): Json<DispositionRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let lead = state
        .reactors
        .record_disposition(&caller, &id, request.disposition)
        .await?;
    Ok(success(lead))
}

/// 修改预约时间
pub async fn reschedule(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<String>,
    Json(request): Json<ScheduleRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let lead = state
        .reactors
        .reschedule(&caller, &id, request.scheduled_time)
        .await?;
    Ok(success(lead))
}
