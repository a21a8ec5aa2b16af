use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lineup_core::{DispatchError, DispatchResult};
use lineup_domain::repositories::ReminderRepository;
use lineup_domain::Reminder;
use sqlx::{PgPool, Row};

const REMINDER_COLUMNS: &str =
    "id, lead_id, closer_id, appointment_time, reminder_time, processed, created_at, updated_at";

pub struct PostgresReminderRepository {
    pool: PgPool,
}

impl PostgresReminderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_reminder(row: &sqlx::postgres::PgRow) -> DispatchResult<Reminder> {
        Ok(Reminder {
            id: row.try_get("id")?,
            lead_id: row.try_get("lead_id")?,
            closer_id: row.try_get("closer_id")?,
            appointment_time: row.try_get("appointment_time")?,
            reminder_time: row.try_get("reminder_time")?,
            processed: row.try_get("processed")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl ReminderRepository for PostgresReminderRepository {
    async fn upsert_for_lead(&self, reminder: &Reminder) -> DispatchResult<()> {
        // 每条线索一条提醒: lead_id唯一, 重设预约时间覆盖旧提醒
        sqlx::query(
            r#"
            INSERT INTO reminders (id, lead_id, closer_id, appointment_time, reminder_time,
                processed, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT(lead_id) DO UPDATE SET
                closer_id = excluded.closer_id,
                appointment_time = excluded.appointment_time,
                reminder_time = excluded.reminder_time,
                processed = excluded.processed,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&reminder.id)
        .bind(&reminder.lead_id)
        .bind(&reminder.closer_id)
        .bind(reminder.appointment_time)
        .bind(reminder.reminder_time)
        .bind(reminder.processed)
        .bind(reminder.created_at)
        .bind(reminder.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DispatchError::Database)?;
        Ok(())
    }

    async fn get_by_lead(&self, lead_id: &str) -> DispatchResult<Option<Reminder>> {
        let row = sqlx::query(&format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders WHERE lead_id = $1"
        ))
        .bind(lead_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DispatchError::Database)?;
        row.map(|r| Self::row_to_reminder(&r)).transpose()
    }

    async fn list_due(&self, now: DateTime<Utc>, limit: i64) -> DispatchResult<Vec<Reminder>> {
        let rows = sqlx::query(&format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders WHERE processed = FALSE AND reminder_time <= $1 ORDER BY reminder_time LIMIT $2"
        ))
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(DispatchError::Database)?;
        rows.iter().map(Self::row_to_reminder).collect()
    }

    async fn mark_processed_batch(&self, reminder_ids: &[String]) -> DispatchResult<()> {
        if reminder_ids.is_empty() {
            return Ok(());
        }
        let placeholders: Vec<String> = (0..reminder_ids.len())
            .map(|i| format!("${}", i + 2))
            .collect();
        let sql = format!(
            "UPDATE reminders SET processed = TRUE, updated_at = $1 WHERE id IN ({})",
            placeholders.join(", ")
        );
        let mut query = sqlx::query(&sql).bind(Utc::now());
        for id in reminder_ids {
            query = query.bind(id);
        }
        query
            .execute(&self.pool)
            .await
            .map_err(DispatchError::Database)?;
        Ok(())
    }
}
