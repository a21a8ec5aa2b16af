use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closer, 派发目标
///
/// 值班状态与团队内的轮转位次 (`lineup_order`) 是派发选择的唯一输入。
/// `lineup_order` 是团队内的建议性全序键, 允许碰撞, 碰撞在选择时按
/// 工作量与姓名确定性消解, 存储层从不强制唯一。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Closer {
    pub id: String,
    pub name: String,
    pub status: DutyStatus,
    pub team_id: String,
    /// 轮转位次, 越小越靠前; 缺失视为队尾
    pub lineup_order: Option<i64>,
    pub last_exception_at: Option<DateTime<Utc>>,
    pub last_exception_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 值班状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DutyStatus {
    #[serde(rename = "ON_DUTY")]
    OnDuty,
    #[serde(rename = "OFF_DUTY")]
    OffDuty,
}

impl DutyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DutyStatus::OnDuty => "ON_DUTY",
            DutyStatus::OffDuty => "OFF_DUTY",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "ON_DUTY" => Ok(DutyStatus::OnDuty),
            "OFF_DUTY" => Ok(DutyStatus::OffDuty),
            _ => Err(format!("Invalid duty status: {s}")),
        }
    }
}

impl sqlx::Type<sqlx::Postgres> for DutyStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("VARCHAR")
    }
}

impl sqlx::Type<sqlx::Sqlite> for DutyStatus {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for DutyStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        DutyStatus::parse(s).map_err(Into::into)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for DutyStatus {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        DutyStatus::parse(s).map_err(Into::into)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for DutyStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for DutyStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Sqlite>>::encode(self.as_str(), buf)
    }
}

impl Closer {
    pub fn new(id: impl Into<String>, name: impl Into<String>, team_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            status: DutyStatus::OffDuty,
            team_id: team_id.into(),
            lineup_order: None,
            last_exception_at: None,
            last_exception_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_on_duty(&self) -> bool {
        matches!(self.status, DutyStatus::OnDuty)
    }

    /// 排序用位次键, 缺失的位次排到队尾
    pub fn order_key(&self) -> i64 {
        self.lineup_order.unwrap_or(i64::MAX)
    }

    pub fn record_exception(&mut self, reason: &str) {
        self.last_exception_at = Some(Utc::now());
        self.last_exception_reason = Some(reason.to_string());
        self.updated_at = Utc::now();
    }
}
