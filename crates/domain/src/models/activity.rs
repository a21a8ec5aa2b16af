use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 追加式审计记录, 写入后不再变更
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: String,
    pub kind: ActivityKind,
    pub lead_id: Option<String>,
    pub closer_id: Option<String>,
    pub team_id: String,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

/// 审计事件类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActivityKind {
    #[serde(rename = "LEAD_ASSIGNED")]
    LeadAssigned,
    #[serde(rename = "LEAD_ACCEPTED")]
    LeadAccepted,
    #[serde(rename = "LEAD_DISPOSITIONED")]
    LeadDispositioned,
    #[serde(rename = "LEAD_VERIFIED")]
    LeadVerified,
    #[serde(rename = "LEAD_REASSIGNED")]
    LeadReassigned,
    #[serde(rename = "ROTATION_MOVED")]
    RotationMoved,
    #[serde(rename = "ROTATION_MOVE_FAILED")]
    RotationMoveFailed,
    #[serde(rename = "DUTY_CHANGED")]
    DutyChanged,
    #[serde(rename = "DISPATCH_ESCALATED")]
    DispatchEscalated,
    #[serde(rename = "VERIFICATION_TIMEOUT")]
    VerificationTimeout,
    #[serde(rename = "REMINDER_SENT")]
    ReminderSent,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::LeadAssigned => "LEAD_ASSIGNED",
            ActivityKind::LeadAccepted => "LEAD_ACCEPTED",
            ActivityKind::LeadDispositioned => "LEAD_DISPOSITIONED",
            ActivityKind::LeadVerified => "LEAD_VERIFIED",
            ActivityKind::LeadReassigned => "LEAD_REASSIGNED",
            ActivityKind::RotationMoved => "ROTATION_MOVED",
            ActivityKind::RotationMoveFailed => "ROTATION_MOVE_FAILED",
            ActivityKind::DutyChanged => "DUTY_CHANGED",
            ActivityKind::DispatchEscalated => "DISPATCH_ESCALATED",
            ActivityKind::VerificationTimeout => "VERIFICATION_TIMEOUT",
            ActivityKind::ReminderSent => "REMINDER_SENT",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "LEAD_ASSIGNED" => Ok(ActivityKind::LeadAssigned),
            "LEAD_ACCEPTED" => Ok(ActivityKind::LeadAccepted),
            "LEAD_DISPOSITIONED" => Ok(ActivityKind::LeadDispositioned),
            "LEAD_VERIFIED" => Ok(ActivityKind::LeadVerified),
            "LEAD_REASSIGNED" => Ok(ActivityKind::LeadReassigned),
            "ROTATION_MOVED" => Ok(ActivityKind::RotationMoved),
            "ROTATION_MOVE_FAILED" => Ok(ActivityKind::RotationMoveFailed),
            "DUTY_CHANGED" => Ok(ActivityKind::DutyChanged),
            "DISPATCH_ESCALATED" => Ok(ActivityKind::DispatchEscalated),
            "VERIFICATION_TIMEOUT" => Ok(ActivityKind::VerificationTimeout),
            "REMINDER_SENT" => Ok(ActivityKind::ReminderSent),
            _ => Err(format!("Invalid activity kind: {s}")),
        }
    }
}

impl sqlx::Type<sqlx::Postgres> for ActivityKind {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("VARCHAR")
    }
}

impl sqlx::Type<sqlx::Sqlite> for ActivityKind {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ActivityKind {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        ActivityKind::parse(s).map_err(Into::into)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for ActivityKind {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        ActivityKind::parse(s).map_err(Into::into)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for ActivityKind {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for ActivityKind {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Sqlite>>::encode(self.as_str(), buf)
    }
}

impl ActivityRecord {
    pub fn new(kind: ActivityKind, team_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            lead_id: None,
            closer_id: None,
            team_id: team_id.into(),
            detail: detail.into(),
            created_at: Utc::now(),
        }
    }

    pub fn with_lead(mut self, lead_id: impl Into<String>) -> Self {
        self.lead_id = Some(lead_id.into());
        self
    }

    pub fn with_closer(mut self, closer_id: impl Into<String>) -> Self {
        self.closer_id = Some(closer_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_record_builder() {
        let record = ActivityRecord::new(ActivityKind::LeadAssigned, "team-1", "assigned to c-1")
            .with_lead("lead-1")
            .with_closer("c-1");
        assert_eq!(record.kind, ActivityKind::LeadAssigned);
        assert_eq!(record.lead_id.as_deref(), Some("lead-1"));
        assert_eq!(record.closer_id.as_deref(), Some("c-1"));
        assert!(!record.id.is_empty());
    }

    #[test]
    fn test_kind_round_trip() {
        let all = [
            ActivityKind::LeadAssigned,
            ActivityKind::LeadAccepted,
            ActivityKind::LeadDispositioned,
            ActivityKind::LeadVerified,
            ActivityKind::LeadReassigned,
            ActivityKind::RotationMoved,
            ActivityKind::RotationMoveFailed,
            ActivityKind::DutyChanged,
            ActivityKind::DispatchEscalated,
            ActivityKind::VerificationTimeout,
            ActivityKind::ReminderSent,
        ];
        for kind in all {
            assert_eq!(ActivityKind::parse(kind.as_str()), Ok(kind));
        }
        assert!(ActivityKind::parse("UNKNOWN").is_err());
    }
}
