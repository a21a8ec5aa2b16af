use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::Lead;

/// 预约提醒, 由带预约时间的线索派生
///
/// 每条线索最多一条待处理提醒, 重设预约时间覆盖旧的提醒时间而不是新建;
/// `processed` 只会从 false 置为 true 一次, 之后不再重发
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub lead_id: String,
    pub closer_id: Option<String>,
    pub appointment_time: DateTime<Utc>,
    pub reminder_time: DateTime<Utc>,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reminder {
    /// 按线索当前的预约时间计算提醒
    ///
    /// 提醒时间 = 预约时间 - 提前量; 已经过去的提醒时间不再生成
    pub fn for_lead(lead: &Lead, lead_minutes: i64, now: DateTime<Utc>) -> Option<Reminder> {
        let appointment_time = lead.scheduled_time?;
        let reminder_time = appointment_time - Duration::minutes(lead_minutes);
        if reminder_time <= now {
            return None;
        }
        Some(Reminder {
            id: uuid::Uuid::new_v4().to_string(),
            lead_id: lead.id.clone(),
            closer_id: lead.assigned_closer_id.clone(),
            appointment_time,
            reminder_time,
            processed: false,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.processed && self.reminder_time <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DispatchType, LeadDraft};

    fn scheduled_lead(minutes_from_now: i64) -> Lead {
        let draft = LeadDraft {
            team_id: Some("team-1".to_string()),
            setter_id: Some("setter-1".to_string()),
            dispatch_type: Some(DispatchType::Scheduled),
            scheduled_time: Some(Utc::now() + Duration::minutes(minutes_from_now)),
            ..LeadDraft::default()
        };
        Lead::from_draft(draft).unwrap()
    }

    #[test]
    fn test_for_lead_computes_reminder_time() {
        let lead = scheduled_lead(60);
        let now = Utc::now();
        let reminder = Reminder::for_lead(&lead, 30, now).unwrap();
        assert_eq!(reminder.lead_id, lead.id);
        assert_eq!(
            reminder.reminder_time,
            lead.scheduled_time.unwrap() - Duration::minutes(30)
        );
        assert!(!reminder.processed);
    }

    #[test]
    fn test_for_lead_skips_past_reminder_time() {
        // 预约在20分钟后, 提前30分钟的提醒点已经过去
        let lead = scheduled_lead(20);
        assert!(Reminder::for_lead(&lead, 30, Utc::now()).is_none());
    }

    #[test]
    fn test_for_lead_without_appointment() {
        let draft = LeadDraft {
            team_id: Some("team-1".to_string()),
            setter_id: Some("setter-1".to_string()),
            ..LeadDraft::default()
        };
        let lead = Lead::from_draft(draft).unwrap();
        assert!(Reminder::for_lead(&lead, 30, Utc::now()).is_none());
    }

    #[test]
    fn test_is_due() {
        let lead = scheduled_lead(60);
        let now = Utc::now();
        let mut reminder = Reminder::for_lead(&lead, 30, now).unwrap();
        assert!(!reminder.is_due(now));
        assert!(reminder.is_due(now + Duration::minutes(31)));
        reminder.processed = true;
        assert!(!reminder.is_due(now + Duration::minutes(31)));
    }
}
