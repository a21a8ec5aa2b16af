use chrono::{DateTime, Utc};
use lineup_core::{DispatchError, DispatchResult};
use serde::{Deserialize, Serialize};

/// 销售线索, 派发的工作单元
///
/// 线索由setter创建, 经派发绑定到closer, 由closer接单/跟进,
/// 最终记录一个终态处置结果。线索从不物理删除, 处置即归档。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub status: LeadStatus,
    pub team_id: String,
    pub dispatch_type: DispatchType,
    pub assigned_closer_id: Option<String>,
    pub assigned_closer_name: Option<String>,
    pub setter_id: String,
    pub setter_name: String,
    pub setter_location: Option<String>,
    pub setter_verified: bool,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub photo_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
}

/// 线索状态机
///
/// `WaitingAssignment` 与 `Scheduled`/`Rescheduled` 是两类入口状态:
/// 前者走即时派发, 后两者按预约时间派发。终态为五种处置结果加超时产生的
/// `Expired`。合法流转见 `state::is_valid_transition`。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LeadStatus {
    #[serde(rename = "WAITING_ASSIGNMENT")]
    WaitingAssignment,
    #[serde(rename = "SCHEDULED")]
    Scheduled,
    #[serde(rename = "RESCHEDULED")]
    Rescheduled,
    #[serde(rename = "ACCEPTED")]
    Accepted,
    #[serde(rename = "IN_PROCESS")]
    InProcess,
    #[serde(rename = "SOLD")]
    Sold,
    #[serde(rename = "NO_SALE")]
    NoSale,
    #[serde(rename = "CANCELED")]
    Canceled,
    #[serde(rename = "CREDIT_FAIL")]
    CreditFail,
    #[serde(rename = "EXPIRED")]
    Expired,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::WaitingAssignment => "WAITING_ASSIGNMENT",
            LeadStatus::Scheduled => "SCHEDULED",
            LeadStatus::Rescheduled => "RESCHEDULED",
            LeadStatus::Accepted => "ACCEPTED",
            LeadStatus::InProcess => "IN_PROCESS",
            LeadStatus::Sold => "SOLD",
            LeadStatus::NoSale => "NO_SALE",
            LeadStatus::Canceled => "CANCELED",
            LeadStatus::CreditFail => "CREDIT_FAIL",
            LeadStatus::Expired => "EXPIRED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "WAITING_ASSIGNMENT" => Ok(LeadStatus::WaitingAssignment),
            "SCHEDULED" => Ok(LeadStatus::Scheduled),
            "RESCHEDULED" => Ok(LeadStatus::Rescheduled),
            "ACCEPTED" => Ok(LeadStatus::Accepted),
            "IN_PROCESS" => Ok(LeadStatus::InProcess),
            "SOLD" => Ok(LeadStatus::Sold),
            "NO_SALE" => Ok(LeadStatus::NoSale),
            "CANCELED" => Ok(LeadStatus::Canceled),
            "CREDIT_FAIL" => Ok(LeadStatus::CreditFail),
            "EXPIRED" => Ok(LeadStatus::Expired),
            _ => Err(format!("Invalid lead status: {s}")),
        }
    }

    /// 活跃状态: 线索仍绑定在closer身上未出结果
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            LeadStatus::WaitingAssignment
                | LeadStatus::Scheduled
                | LeadStatus::Rescheduled
                | LeadStatus::Accepted
                | LeadStatus::InProcess
        )
    }

    /// 预约入口状态
    pub fn is_appointment_entry(&self) -> bool {
        matches!(self, LeadStatus::Scheduled | LeadStatus::Rescheduled)
    }

    /// 终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LeadStatus::Sold
                | LeadStatus::NoSale
                | LeadStatus::Canceled
                | LeadStatus::CreditFail
                | LeadStatus::Expired
        )
    }

    /// 由closer主动记录的处置终态 (Expired只能由超时产生, 不算处置)
    pub fn is_disposition(&self) -> bool {
        matches!(
            self,
            LeadStatus::Sold
                | LeadStatus::NoSale
                | LeadStatus::Canceled
                | LeadStatus::Rescheduled
                | LeadStatus::CreditFail
        )
    }
}

impl sqlx::Type<sqlx::Postgres> for LeadStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("VARCHAR")
    }
}

impl sqlx::Type<sqlx::Sqlite> for LeadStatus {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for LeadStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        LeadStatus::parse(s).map_err(Into::into)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for LeadStatus {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        LeadStatus::parse(s).map_err(Into::into)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for LeadStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for LeadStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Sqlite>>::encode(self.as_str(), buf)
    }
}

/// 派发方式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DispatchType {
    #[serde(rename = "IMMEDIATE")]
    Immediate,
    #[serde(rename = "SCHEDULED")]
    Scheduled,
}

impl DispatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchType::Immediate => "IMMEDIATE",
            DispatchType::Scheduled => "SCHEDULED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "IMMEDIATE" => Ok(DispatchType::Immediate),
            "SCHEDULED" => Ok(DispatchType::Scheduled),
            _ => Err(format!("Invalid dispatch type: {s}")),
        }
    }
}

impl sqlx::Type<sqlx::Postgres> for DispatchType {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("VARCHAR")
    }
}

impl sqlx::Type<sqlx::Sqlite> for DispatchType {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for DispatchType {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        DispatchType::parse(s).map_err(Into::into)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for DispatchType {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        DispatchType::parse(s).map_err(Into::into)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for DispatchType {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for DispatchType {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Sqlite>>::encode(self.as_str(), buf)
    }
}

/// 创建线索的原始输入
///
/// 外部写入的字段形态不可控, 这里集中做一次归一化,
/// 引擎其余部分只接触归一化后的 `Lead`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadDraft {
    pub id: Option<String>,
    pub customer_name: Option<String>,
    /// 旧数据写入用的字段名, 与 `customer_name` 二选一
    pub name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub team_id: Option<String>,
    pub dispatch_type: Option<DispatchType>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub setter_id: Option<String>,
    pub setter_name: Option<String>,
    pub setter_location: Option<String>,
    pub photo_urls: Option<Vec<String>>,
}

impl Lead {
    /// 归一化入口: 从原始输入构造良构线索
    ///
    /// 派发方式缺省时按预约时间推断; 即时线索入口状态为待派发,
    /// 预约线索入口状态为已排期且必须带预约时间
    pub fn from_draft(draft: LeadDraft) -> DispatchResult<Lead> {
        let team_id = draft
            .team_id
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| DispatchError::precondition("线索缺少team_id"))?;
        let setter_id = draft
            .setter_id
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| DispatchError::precondition("线索缺少setter_id"))?;

        let dispatch_type = draft.dispatch_type.unwrap_or(match draft.scheduled_time {
            Some(_) => DispatchType::Scheduled,
            None => DispatchType::Immediate,
        });

        if dispatch_type == DispatchType::Scheduled && draft.scheduled_time.is_none() {
            return Err(DispatchError::precondition("预约派发的线索缺少预约时间"));
        }

        let status = match dispatch_type {
            DispatchType::Immediate => LeadStatus::WaitingAssignment,
            DispatchType::Scheduled => LeadStatus::Scheduled,
        };

        let customer_name = draft
            .customer_name
            .or(draft.name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        let now = Utc::now();
        Ok(Lead {
            id: draft
                .id
                .filter(|i| !i.trim().is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            customer_name,
            customer_phone: draft.customer_phone.unwrap_or_default(),
            customer_address: draft.customer_address.unwrap_or_default(),
            status,
            team_id,
            dispatch_type,
            assigned_closer_id: None,
            assigned_closer_name: None,
            setter_name: draft.setter_name.unwrap_or_else(|| setter_id.clone()),
            setter_id,
            setter_location: draft.setter_location,
            setter_verified: false,
            verified_by: None,
            verified_at: None,
            scheduled_time: draft.scheduled_time,
            photo_urls: draft.photo_urls.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            accepted_at: None,
        })
    }

    /// 线索是否占用closer的容量名额
    ///
    /// 未核验的预约线索随时可能被超时取消, 不占名额, 也不影响轮转公平
    pub fn consumes_capacity_slot(&self) -> bool {
        if !self.status.is_active() {
            return false;
        }
        if self.status.is_appointment_entry() {
            return self.setter_verified;
        }
        true
    }

    /// 当前状态下closer是否可接单 (核验门控见 `setter_verified`)
    pub fn is_claimable(&self) -> bool {
        match self.status {
            LeadStatus::WaitingAssignment => true,
            LeadStatus::Scheduled | LeadStatus::Rescheduled => self.setter_verified,
            _ => false,
        }
    }

    pub fn bind_closer(&mut self, closer_id: &str, closer_name: &str) {
        self.assigned_closer_id = Some(closer_id.to_string());
        self.assigned_closer_name = Some(closer_name.to_string());
        self.updated_at = Utc::now();
    }

    pub fn clear_assignment(&mut self) {
        self.assigned_closer_id = None;
        self.assigned_closer_name = None;
        self.updated_at = Utc::now();
    }

    pub fn mark_verified(&mut self, verifier_id: &str) {
        self.setter_verified = true;
        self.verified_by = Some(verifier_id.to_string());
        self.verified_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }
}

/// 给定closer名下的活跃线索集合, 计算其有效工作量
pub fn live_assignment_count<'a, I>(leads: I) -> i64
where
    I: IntoIterator<Item = &'a Lead>,
{
    leads
        .into_iter()
        .filter(|lead| lead.consumes_capacity_slot())
        .count() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> LeadDraft {
        LeadDraft {
            team_id: Some("team-1".to_string()),
            setter_id: Some("setter-1".to_string()),
            ..LeadDraft::default()
        }
    }

    #[test]
    fn test_from_draft_defaults_to_immediate() {
        let lead = Lead::from_draft(draft()).unwrap();
        assert_eq!(lead.dispatch_type, DispatchType::Immediate);
        assert_eq!(lead.status, LeadStatus::WaitingAssignment);
        assert_eq!(lead.customer_name, "Unknown");
        assert!(lead.assigned_closer_id.is_none());
        assert!(!lead.setter_verified);
    }

    #[test]
    fn test_from_draft_infers_scheduled_from_appointment() {
        let mut d = draft();
        d.scheduled_time = Some(Utc::now());
        let lead = Lead::from_draft(d).unwrap();
        assert_eq!(lead.dispatch_type, DispatchType::Scheduled);
        assert_eq!(lead.status, LeadStatus::Scheduled);
    }

    #[test]
    fn test_from_draft_name_fallback() {
        let mut d = draft();
        d.name = Some("Zhang San".to_string());
        let lead = Lead::from_draft(d).unwrap();
        assert_eq!(lead.customer_name, "Zhang San");

        let mut d = draft();
        d.customer_name = Some("Primary".to_string());
        d.name = Some("Secondary".to_string());
        let lead = Lead::from_draft(d).unwrap();
        assert_eq!(lead.customer_name, "Primary");
    }

    #[test]
    fn test_from_draft_requires_team_and_setter() {
        let mut d = draft();
        d.team_id = None;
        assert!(Lead::from_draft(d).is_err());

        let mut d = draft();
        d.setter_id = Some("  ".to_string());
        assert!(Lead::from_draft(d).is_err());
    }

    #[test]
    fn test_scheduled_dispatch_requires_time() {
        let mut d = draft();
        d.dispatch_type = Some(DispatchType::Scheduled);
        assert!(Lead::from_draft(d).is_err());
    }

    #[test]
    fn test_capacity_slot_excludes_unverified_appointment() {
        let mut d = draft();
        d.scheduled_time = Some(Utc::now());
        let mut lead = Lead::from_draft(d).unwrap();
        assert!(!lead.consumes_capacity_slot());

        lead.mark_verified("setter-1");
        assert!(lead.consumes_capacity_slot());
    }

    #[test]
    fn test_capacity_slot_terminal_states() {
        let mut lead = Lead::from_draft(draft()).unwrap();
        assert!(lead.consumes_capacity_slot());
        lead.status = LeadStatus::Sold;
        assert!(!lead.consumes_capacity_slot());
    }

    #[test]
    fn test_live_assignment_count() {
        let immediate = Lead::from_draft(draft()).unwrap();

        let mut d = draft();
        d.scheduled_time = Some(Utc::now());
        let unverified = Lead::from_draft(d).unwrap();

        let mut verified = unverified.clone();
        verified.mark_verified("setter-1");

        assert_eq!(live_assignment_count([&unverified]), 0);
        assert_eq!(live_assignment_count([&verified]), 1);
        assert_eq!(live_assignment_count([&immediate, &unverified]), 1);
        assert_eq!(live_assignment_count([&immediate, &verified]), 2);
    }

    #[test]
    fn test_claimable_requires_verification_for_appointments() {
        let mut d = draft();
        d.scheduled_time = Some(Utc::now());
        let mut lead = Lead::from_draft(d).unwrap();
        assert!(!lead.is_claimable());
        lead.mark_verified("mgr-1");
        assert!(lead.is_claimable());
        lead.status = LeadStatus::Sold;
        assert!(!lead.is_claimable());
    }

    #[test]
    fn test_status_string_round_trip() {
        let all = [
            LeadStatus::WaitingAssignment,
            LeadStatus::Scheduled,
            LeadStatus::Rescheduled,
            LeadStatus::Accepted,
            LeadStatus::InProcess,
            LeadStatus::Sold,
            LeadStatus::NoSale,
            LeadStatus::Canceled,
            LeadStatus::CreditFail,
            LeadStatus::Expired,
        ];
        for status in all {
            assert_eq!(LeadStatus::parse(status.as_str()), Ok(status));
        }
        assert!(LeadStatus::parse("UNKNOWN").is_err());
    }
}
