use serde::{Deserialize, Serialize};

/// 触发操作的调用者身份
///
/// 认证本身在引擎范围之外, 网关以可信请求头传入身份;
/// 引擎只负责按角色与团队做操作级别的权限判断
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: String,
    pub role: CallerRole,
    pub team_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CallerRole {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "MANAGER")]
    Manager,
    #[serde(rename = "CLOSER")]
    Closer,
    #[serde(rename = "SETTER")]
    Setter,
}

impl CallerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallerRole::Admin => "ADMIN",
            CallerRole::Manager => "MANAGER",
            CallerRole::Closer => "CLOSER",
            CallerRole::Setter => "SETTER",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "ADMIN" => Ok(CallerRole::Admin),
            "MANAGER" => Ok(CallerRole::Manager),
            "CLOSER" => Ok(CallerRole::Closer),
            "SETTER" => Ok(CallerRole::Setter),
            _ => Err(format!("Invalid caller role: {s}")),
        }
    }
}

impl Caller {
    pub fn new(user_id: impl Into<String>, role: CallerRole) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            team_id: None,
        }
    }

    pub fn with_team(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    /// 管理角色: 可以替他人发起派发/换位操作
    pub fn is_supervisor(&self) -> bool {
        matches!(self.role, CallerRole::Admin | CallerRole::Manager)
    }

    /// 可以核验预约的角色
    pub fn can_verify(&self) -> bool {
        matches!(
            self.role,
            CallerRole::Admin | CallerRole::Manager | CallerRole::Setter
        )
    }
}
