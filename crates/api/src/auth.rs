//! 调用者身份提取
//!
//! 认证在引擎范围之外: 网关完成登录校验后, 以可信请求头把身份
//! 传给引擎。这里只负责把请求头解析成 `Caller`, 角色级别的权限
//! 判断在事件反应器里做。

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use lineup_domain::{Caller, CallerRole};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const TEAM_ID_HEADER: &str = "x-team-id";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("缺少身份请求头: {0}")]
    MissingHeader(&'static str),

    #[error("请求头格式错误: {0}")]
    InvalidHeader(&'static str),

    #[error("未知角色: {0}")]
    InvalidRole(String),
}

/// 从网关请求头解析出的调用者
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub Caller);

fn header_value<'a>(
    parts: &'a Parts,
    name: &'static str,
) -> Result<Option<&'a str>, AuthError> {
    match parts.headers.get(name) {
        Some(value) => {
            let s = value.to_str().map_err(|_| AuthError::InvalidHeader(name))?;
            Ok(Some(s))
        }
        None => Ok(None),
    }
}

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = crate::error::ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, USER_ID_HEADER)?
            .filter(|s| !s.trim().is_empty())
            .ok_or(AuthError::MissingHeader(USER_ID_HEADER))?
            .to_string();

        let role_raw = header_value(parts, USER_ROLE_HEADER)?
            .ok_or(AuthError::MissingHeader(USER_ROLE_HEADER))?;
        let role = CallerRole::parse(role_raw)
            .map_err(|_| AuthError::InvalidRole(role_raw.to_string()))?;

        let team_id = header_value(parts, TEAM_ID_HEADER)?
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string);

        let mut caller = Caller::new(user_id, role);
        caller.team_id = team_id;
        Ok(CallerIdentity(caller))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_for(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/api/leads");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_full_identity_extraction() {
        let mut parts = parts_for(&[
            (USER_ID_HEADER, "u-1"),
            (USER_ROLE_HEADER, "MANAGER"),
            (TEAM_ID_HEADER, "team-1"),
        ]);
        let CallerIdentity(caller) = CallerIdentity::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(caller.user_id, "u-1");
        assert_eq!(caller.role, CallerRole::Manager);
        assert_eq!(caller.team_id.as_deref(), Some("team-1"));
    }

    #[tokio::test]
    async fn test_team_header_is_optional() {
        let mut parts = parts_for(&[(USER_ID_HEADER, "u-1"), (USER_ROLE_HEADER, "ADMIN")]);
        let CallerIdentity(caller) = CallerIdentity::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(caller.team_id.is_none());
        assert!(caller.is_supervisor());
    }

    #[tokio::test]
    async fn test_missing_user_id_rejected() {
        let mut parts = parts_for(&[(USER_ROLE_HEADER, "CLOSER")]);
        assert!(CallerIdentity::from_request_parts(&mut parts, &())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_unknown_role_rejected() {
        let mut parts = parts_for(&[(USER_ID_HEADER, "u-1"), (USER_ROLE_HEADER, "GUEST")]);
        assert!(CallerIdentity::from_request_parts(&mut parts, &())
            .await
            .is_err());
    }
}
