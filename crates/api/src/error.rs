use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lineup_core::DispatchError;
use lineup_infrastructure::StructuredLogger;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("派发引擎错误: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("认证错误: {0}")]
    Authentication(#[from] crate::auth::AuthError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_type, suggestions) = match &self {
            ApiError::Dispatch(DispatchError::LeadNotFound { id }) => (
                StatusCode::NOT_FOUND,
                format!("线索 {id} 不存在"),
                "LEAD_NOT_FOUND".to_string(),
                vec![
                    "请检查线索ID是否正确".to_string(),
                    "使用 GET /api/teams/{team_id}/stats 查看团队线索概况".to_string(),
                ],
            ),
            ApiError::Dispatch(DispatchError::CloserNotFound { id }) => (
                StatusCode::NOT_FOUND,
                format!("closer {id} 不存在"),
                "CLOSER_NOT_FOUND".to_string(),
                vec![
                    "请检查closer ID是否正确".to_string(),
                    "使用 GET /api/teams/{team_id}/lineup 查看团队轮转名单".to_string(),
                ],
            ),
            ApiError::Dispatch(DispatchError::PermissionDenied(msg)) => (
                StatusCode::FORBIDDEN,
                format!("权限不足: {msg}"),
                "PERMISSION_DENIED".to_string(),
                vec!["您的角色没有执行此操作的权限".to_string()],
            ),
            ApiError::Dispatch(DispatchError::InvalidPrecondition(msg)) => (
                StatusCode::BAD_REQUEST,
                format!("前置条件不满足: {msg}"),
                "INVALID_PRECONDITION".to_string(),
                vec!["请刷新线索状态后重试".to_string()],
            ),
            ApiError::Dispatch(DispatchError::InvalidTransition { from, to }) => (
                StatusCode::CONFLICT,
                format!("非法状态流转: {from} -> {to}"),
                "INVALID_TRANSITION".to_string(),
                vec![
                    "线索状态已被其他操作改变".to_string(),
                    "请刷新线索状态后重试".to_string(),
                ],
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                format!("请求参数错误: {msg}"),
                "BAD_REQUEST".to_string(),
                vec!["请检查请求格式和参数".to_string()],
            ),
            ApiError::Authentication(auth_error) => (
                StatusCode::UNAUTHORIZED,
                auth_error.to_string(),
                "AUTHENTICATION_ERROR".to_string(),
                vec!["请检查网关传入的身份请求头".to_string()],
            ),
            // 基础设施错误只暴露通用描述, 详情进日志
            ApiError::Dispatch(err) => {
                StructuredLogger::log_system_error("api", "handle_request", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "系统内部错误".to_string(),
                    "INTERNAL_ERROR".to_string(),
                    vec![
                        "系统遇到内部错误, 请稍后重试".to_string(),
                        "查看 GET /health 检查系统状态".to_string(),
                    ],
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "type": error_type,
                "code": status.as_u16(),
                "suggestions": suggestions,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
