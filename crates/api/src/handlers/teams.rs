use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::{error::ApiError, error::ApiResult, response::success, routes::AppState};

const DEFAULT_ACTIVITY_LIMIT: i64 = 50;
const MAX_ACTIVITY_LIMIT: i64 = 500;

/// 审计查询参数
#[derive(Debug, Deserialize)]
pub struct ActivityQueryParams {
    pub limit: Option<i64>,
}

/// 团队线索统计与轮转概况
pub async fn get_team_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let stats = state.reactors.team_stats(&id).await?;
    Ok(success(stats))
}

/// 当前轮转名单, 按派发顺序排列
pub async fn get_team_lineup(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let lineup = state.reactors.team_lineup(&id).await?;
    Ok(success(lineup))
}

/// 团队近期审计事件
pub async fn get_team_activity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ActivityQueryParams>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
    if limit <= 0 || limit > MAX_ACTIVITY_LIMIT {
        return Err(ApiError::BadRequest(format!(
            "limit 必须在 1..={MAX_ACTIVITY_LIMIT} 之间"
        )));
    }
    let records = state.reactors.team_activity(&id, limit).await?;
    Ok(success(records))
}
