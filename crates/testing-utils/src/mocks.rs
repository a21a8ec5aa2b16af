//! Mock implementations for all repository and provider traits
//!
//! In-memory implementations backed by `Arc<Mutex<..>>` so they can be
//! cloned into services and inspected from the test afterwards. No
//! database or push gateway required.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use lineup_core::{DispatchError, DispatchResult};
use lineup_domain::models::live_assignment_count;
use lineup_domain::repositories::{
    ActivityRepository, CloserRepository, DeviceTokenRepository, LeadRepository,
    ReminderRepository, TeamLeadStats,
};
use lineup_domain::{
    ActivityRecord, Closer, DutyStatus, Lead, PushPayload, PushProvider, PushReport, Reminder,
};

/// Mock implementation of LeadRepository for testing
#[derive(Debug, Clone, Default)]
pub struct MockLeadRepository {
    leads: Arc<Mutex<HashMap<String, Lead>>>,
}

impl MockLeadRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_leads(leads: Vec<Lead>) -> Self {
        let map = leads.into_iter().map(|l| (l.id.clone(), l)).collect();
        Self {
            leads: Arc::new(Mutex::new(map)),
        }
    }

    pub fn insert(&self, lead: Lead) {
        self.leads.lock().unwrap().insert(lead.id.clone(), lead);
    }

    pub fn count(&self) -> usize {
        self.leads.lock().unwrap().len()
    }

    pub fn get_all(&self) -> Vec<Lead> {
        self.leads.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl LeadRepository for MockLeadRepository {
    async fn create(&self, lead: &Lead) -> DispatchResult<Lead> {
        let mut leads = self.leads.lock().unwrap();
        if leads.contains_key(&lead.id) {
            return Err(DispatchError::database_operation(format!(
                "duplicate lead id: {}",
                lead.id
            )));
        }
        leads.insert(lead.id.clone(), lead.clone());
        Ok(lead.clone())
    }

    async fn get_by_id(&self, id: &str) -> DispatchResult<Option<Lead>> {
        Ok(self.leads.lock().unwrap().get(id).cloned())
    }

    async fn update(&self, lead: &Lead) -> DispatchResult<()> {
        self.leads
            .lock()
            .unwrap()
            .insert(lead.id.clone(), lead.clone());
        Ok(())
    }

    async fn list_by_team(&self, team_id: &str) -> DispatchResult<Vec<Lead>> {
        Ok(self
            .leads
            .lock()
            .unwrap()
            .values()
            .filter(|l| l.team_id == team_id)
            .cloned()
            .collect())
    }

    async fn list_active_by_closer(&self, closer_id: &str) -> DispatchResult<Vec<Lead>> {
        Ok(self
            .leads
            .lock()
            .unwrap()
            .values()
            .filter(|l| l.status.is_active() && l.assigned_closer_id.as_deref() == Some(closer_id))
            .cloned()
            .collect())
    }

    async fn live_assignment_count(&self, closer_id: &str) -> DispatchResult<i64> {
        let leads = self.leads.lock().unwrap();
        let active: Vec<&Lead> = leads
            .values()
            .filter(|l| l.status.is_active() && l.assigned_closer_id.as_deref() == Some(closer_id))
            .collect();
        Ok(live_assignment_count(active.into_iter()))
    }

    async fn list_pending_appointments(&self) -> DispatchResult<Vec<Lead>> {
        Ok(self
            .leads
            .lock()
            .unwrap()
            .values()
            .filter(|l| l.status.is_appointment_entry() && l.scheduled_time.is_some())
            .cloned()
            .collect())
    }

    async fn team_stats(&self, team_id: &str) -> DispatchResult<TeamLeadStats> {
        let leads = self.leads.lock().unwrap();
        let mut stats = TeamLeadStats::default();
        for lead in leads.values().filter(|l| l.team_id == team_id) {
            stats.total_leads += 1;
            *stats
                .by_status
                .entry(lead.status.as_str().to_string())
                .or_insert(0) += 1;
            if lead.status.is_active() {
                if let Some(closer_id) = &lead.assigned_closer_id {
                    *stats.by_closer.entry(closer_id.clone()).or_insert(0) += 1;
                }
            }
        }
        Ok(stats)
    }
}

/// Mock implementation of CloserRepository for testing
#[derive(Debug, Clone, Default)]
pub struct MockCloserRepository {
    closers: Arc<Mutex<HashMap<String, Closer>>>,
}

impl MockCloserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_closers(closers: Vec<Closer>) -> Self {
        let map = closers.into_iter().map(|c| (c.id.clone(), c)).collect();
        Self {
            closers: Arc::new(Mutex::new(map)),
        }
    }

    pub fn insert(&self, closer: Closer) {
        self.closers
            .lock()
            .unwrap()
            .insert(closer.id.clone(), closer);
    }

    pub fn get(&self, id: &str) -> Option<Closer> {
        self.closers.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl CloserRepository for MockCloserRepository {
    async fn create(&self, closer: &Closer) -> DispatchResult<Closer> {
        self.closers
            .lock()
            .unwrap()
            .insert(closer.id.clone(), closer.clone());
        Ok(closer.clone())
    }

    async fn get_by_id(&self, id: &str) -> DispatchResult<Option<Closer>> {
        Ok(self.closers.lock().unwrap().get(id).cloned())
    }

    async fn update(&self, closer: &Closer) -> DispatchResult<()> {
        self.closers
            .lock()
            .unwrap()
            .insert(closer.id.clone(), closer.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> DispatchResult<()> {
        self.closers.lock().unwrap().remove(id);
        Ok(())
    }

    async fn list_by_team(&self, team_id: &str) -> DispatchResult<Vec<Closer>> {
        Ok(self
            .closers
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.team_id == team_id)
            .cloned()
            .collect())
    }

    async fn list_on_duty(&self, team_id: &str) -> DispatchResult<Vec<Closer>> {
        Ok(self
            .closers
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.team_id == team_id && c.status == DutyStatus::OnDuty)
            .cloned()
            .collect())
    }

    async fn team_orders(&self, team_id: &str) -> DispatchResult<Vec<i64>> {
        Ok(self
            .closers
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.team_id == team_id)
            .filter_map(|c| c.lineup_order)
            .collect())
    }

    async fn update_lineup_order(&self, closer_id: &str, order: i64) -> DispatchResult<()> {
        let mut closers = self.closers.lock().unwrap();
        let closer = closers
            .get_mut(closer_id)
            .ok_or_else(|| DispatchError::CloserNotFound {
                id: closer_id.to_string(),
            })?;
        closer.lineup_order = Some(order);
        closer.updated_at = Utc::now();
        Ok(())
    }
}

/// Mock implementation of ActivityRepository for testing
#[derive(Debug, Clone, Default)]
pub struct MockActivityRepository {
    records: Arc<Mutex<Vec<ActivityRecord>>>,
}

impl MockActivityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn get_all(&self) -> Vec<ActivityRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Records of a given kind, in insertion order
    pub fn of_kind(&self, kind: lineup_domain::ActivityKind) -> Vec<ActivityRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ActivityRepository for MockActivityRepository {
    async fn append(&self, record: &ActivityRecord) -> DispatchResult<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn list_recent_by_team(
        &self,
        team_id: &str,
        limit: i64,
    ) -> DispatchResult<Vec<ActivityRecord>> {
        let mut records: Vec<ActivityRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.team_id == team_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit.max(0) as usize);
        Ok(records)
    }
}

/// Mock implementation of ReminderRepository for testing
#[derive(Debug, Clone, Default)]
pub struct MockReminderRepository {
    reminders: Arc<Mutex<HashMap<String, Reminder>>>,
}

impl MockReminderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, reminder: Reminder) {
        self.reminders
            .lock()
            .unwrap()
            .insert(reminder.lead_id.clone(), reminder);
    }

    pub fn count(&self) -> usize {
        self.reminders.lock().unwrap().len()
    }
}

#[async_trait]
impl ReminderRepository for MockReminderRepository {
    async fn upsert_for_lead(&self, reminder: &Reminder) -> DispatchResult<()> {
        let mut reminders = self.reminders.lock().unwrap();
        match reminders.get_mut(&reminder.lead_id) {
            Some(existing) if !existing.processed => {
                existing.closer_id = reminder.closer_id.clone();
                existing.appointment_time = reminder.appointment_time;
                existing.reminder_time = reminder.reminder_time;
                existing.updated_at = Utc::now();
            }
            _ => {
                reminders.insert(reminder.lead_id.clone(), reminder.clone());
            }
        }
        Ok(())
    }

    async fn get_by_lead(&self, lead_id: &str) -> DispatchResult<Option<Reminder>> {
        Ok(self.reminders.lock().unwrap().get(lead_id).cloned())
    }

    async fn list_due(&self, now: DateTime<Utc>, limit: i64) -> DispatchResult<Vec<Reminder>> {
        let mut due: Vec<Reminder> = self
            .reminders
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.is_due(now))
            .cloned()
            .collect();
        due.sort_by(|a, b| a.reminder_time.cmp(&b.reminder_time));
        due.truncate(limit.max(0) as usize);
        Ok(due)
    }

    async fn mark_processed_batch(&self, reminder_ids: &[String]) -> DispatchResult<()> {
        let mut reminders = self.reminders.lock().unwrap();
        for reminder in reminders.values_mut() {
            if reminder_ids.contains(&reminder.id) {
                reminder.processed = true;
                reminder.updated_at = Utc::now();
            }
        }
        Ok(())
    }
}

/// Mock implementation of DeviceTokenRepository for testing
#[derive(Debug, Clone, Default)]
pub struct MockDeviceTokenRepository {
    tokens: Arc<Mutex<HashMap<String, Vec<String>>>>,
}

impl MockDeviceTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(entries: Vec<(&str, &str)>) -> Self {
        let repo = Self::new();
        {
            let mut tokens = repo.tokens.lock().unwrap();
            for (closer_id, token) in entries {
                tokens
                    .entry(closer_id.to_string())
                    .or_default()
                    .push(token.to_string());
            }
        }
        repo
    }

    pub fn all_tokens(&self) -> Vec<String> {
        self.tokens
            .lock()
            .unwrap()
            .values()
            .flatten()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DeviceTokenRepository for MockDeviceTokenRepository {
    async fn add(&self, closer_id: &str, token: &str) -> DispatchResult<()> {
        let mut tokens = self.tokens.lock().unwrap();
        let entry = tokens.entry(closer_id.to_string()).or_default();
        if !entry.iter().any(|t| t == token) {
            entry.push(token.to_string());
        }
        Ok(())
    }

    async fn remove(&self, closer_id: &str, token: &str) -> DispatchResult<()> {
        let mut tokens = self.tokens.lock().unwrap();
        if let Some(entry) = tokens.get_mut(closer_id) {
            entry.retain(|t| t != token);
        }
        Ok(())
    }

    async fn tokens_for(&self, closer_id: &str) -> DispatchResult<Vec<String>> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .get(closer_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn remove_tokens(&self, to_remove: &[String]) -> DispatchResult<()> {
        let mut tokens = self.tokens.lock().unwrap();
        for entry in tokens.values_mut() {
            entry.retain(|t| !to_remove.contains(t));
        }
        Ok(())
    }
}

/// One recorded multicast send
#[derive(Debug, Clone)]
pub struct SentPush {
    pub tokens: Vec<String>,
    pub payload: PushPayload,
}

/// Mock push provider with controllable failure modes
///
/// Records every multicast it receives. Tokens registered via
/// `mark_invalid` are reported back as permanently invalid, and
/// `fail_next` makes the next send return a delivery error.
#[derive(Debug, Clone, Default)]
pub struct MockPushProvider {
    sent: Arc<Mutex<Vec<SentPush>>>,
    invalid_tokens: Arc<Mutex<Vec<String>>>,
    fail_next: Arc<Mutex<bool>>,
}

impl MockPushProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_invalid(&self, token: &str) {
        self.invalid_tokens.lock().unwrap().push(token.to_string());
    }

    pub fn fail_next(&self) {
        *self.fail_next.lock().unwrap() = true;
    }

    pub fn sent(&self) -> Vec<SentPush> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl PushProvider for MockPushProvider {
    async fn send_multicast(
        &self,
        tokens: &[String],
        payload: &PushPayload,
    ) -> DispatchResult<PushReport> {
        {
            let mut fail = self.fail_next.lock().unwrap();
            if *fail {
                *fail = false;
                return Err(DispatchError::PushDelivery(
                    "mock provider failure".to_string(),
                ));
            }
        }

        self.sent.lock().unwrap().push(SentPush {
            tokens: tokens.to_vec(),
            payload: payload.clone(),
        });

        let invalid = self.invalid_tokens.lock().unwrap();
        let invalid_tokens: Vec<String> = tokens
            .iter()
            .filter(|t| invalid.contains(t))
            .cloned()
            .collect();
        Ok(PushReport {
            delivered: tokens.len() - invalid_tokens.len(),
            invalid_tokens,
        })
    }
}
