//! Test data builders for creating test entities
//!
//! Builder patterns with sensible defaults and easy customization.

use chrono::{DateTime, Duration, Utc};

use lineup_domain::{Closer, DispatchType, DutyStatus, Lead, LeadStatus, Reminder};

/// Builder for creating test Lead entities
pub struct LeadBuilder {
    lead: Lead,
}

impl LeadBuilder {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            lead: Lead {
                id: "lead-1".to_string(),
                customer_name: "Test Customer".to_string(),
                customer_phone: "555-0100".to_string(),
                customer_address: "1 Main St".to_string(),
                status: LeadStatus::WaitingAssignment,
                team_id: "team-1".to_string(),
                dispatch_type: DispatchType::Immediate,
                assigned_closer_id: None,
                assigned_closer_name: None,
                setter_id: "setter-1".to_string(),
                setter_name: "Test Setter".to_string(),
                setter_location: None,
                setter_verified: false,
                verified_by: None,
                verified_at: None,
                scheduled_time: None,
                photo_urls: vec![],
                created_at: now,
                updated_at: now,
                accepted_at: None,
            },
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.lead.id = id.to_string();
        self
    }

    pub fn with_team(mut self, team_id: &str) -> Self {
        self.lead.team_id = team_id.to_string();
        self
    }

    pub fn with_customer_name(mut self, name: &str) -> Self {
        self.lead.customer_name = name.to_string();
        self
    }

    pub fn with_setter(mut self, setter_id: &str) -> Self {
        self.lead.setter_id = setter_id.to_string();
        self.lead.setter_name = setter_id.to_string();
        self
    }

    pub fn with_status(mut self, status: LeadStatus) -> Self {
        self.lead.status = status;
        self
    }

    /// Turns the lead into a scheduled appointment at the given time
    pub fn scheduled_at(mut self, time: DateTime<Utc>) -> Self {
        self.lead.dispatch_type = DispatchType::Scheduled;
        self.lead.status = LeadStatus::Scheduled;
        self.lead.scheduled_time = Some(time);
        self
    }

    /// Scheduled appointment some minutes from now
    pub fn scheduled_in_minutes(self, minutes: i64) -> Self {
        self.scheduled_at(Utc::now() + Duration::minutes(minutes))
    }

    pub fn assigned_to(mut self, closer_id: &str, closer_name: &str) -> Self {
        self.lead.assigned_closer_id = Some(closer_id.to_string());
        self.lead.assigned_closer_name = Some(closer_name.to_string());
        self
    }

    pub fn verified(mut self) -> Self {
        self.lead.setter_verified = true;
        self.lead.verified_by = Some("manager-1".to_string());
        self.lead.verified_at = Some(Utc::now());
        self
    }

    pub fn build(self) -> Lead {
        self.lead
    }
}

impl Default for LeadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test Closer entities
///
/// Defaults to an on-duty closer without a lineup order, ready to
/// participate in dispatch.
pub struct CloserBuilder {
    closer: Closer,
}

impl CloserBuilder {
    pub fn new() -> Self {
        let mut closer = Closer::new("closer-1", "Test Closer", "team-1");
        closer.status = DutyStatus::OnDuty;
        Self { closer }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.closer.id = id.to_string();
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.closer.name = name.to_string();
        self
    }

    pub fn with_team(mut self, team_id: &str) -> Self {
        self.closer.team_id = team_id.to_string();
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.closer.lineup_order = Some(order);
        self
    }

    pub fn off_duty(mut self) -> Self {
        self.closer.status = DutyStatus::OffDuty;
        self
    }

    pub fn build(self) -> Closer {
        self.closer
    }
}

impl Default for CloserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test Reminder entities
pub struct ReminderBuilder {
    reminder: Reminder,
}

impl ReminderBuilder {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            reminder: Reminder {
                id: uuid::Uuid::new_v4().to_string(),
                lead_id: "lead-1".to_string(),
                closer_id: Some("closer-1".to_string()),
                appointment_time: now + Duration::minutes(60),
                reminder_time: now + Duration::minutes(30),
                processed: false,
                created_at: now,
                updated_at: now,
            },
        }
    }

    pub fn with_lead(mut self, lead_id: &str) -> Self {
        self.reminder.lead_id = lead_id.to_string();
        self
    }

    pub fn with_closer(mut self, closer_id: Option<&str>) -> Self {
        self.reminder.closer_id = closer_id.map(str::to_string);
        self
    }

    /// Reminder already due: reminder time in the past, appointment ahead
    pub fn due(mut self) -> Self {
        self.reminder.reminder_time = Utc::now() - Duration::minutes(1);
        self.reminder.appointment_time = Utc::now() + Duration::minutes(29);
        self
    }

    pub fn processed(mut self) -> Self {
        self.reminder.processed = true;
        self
    }

    pub fn build(self) -> Reminder {
        self.reminder
    }
}

impl Default for ReminderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
