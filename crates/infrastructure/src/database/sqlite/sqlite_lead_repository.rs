use async_trait::async_trait;
use lineup_core::{DispatchError, DispatchResult};
use lineup_domain::repositories::{LeadRepository, TeamLeadStats};
use lineup_domain::Lead;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::database::mapping::{photo_urls_from_json, photo_urls_to_json};

/// 活跃状态集合, 与 `LeadStatus::is_active` 保持一致
const ACTIVE_STATUSES: &str = "('WAITING_ASSIGNMENT','SCHEDULED','RESCHEDULED','ACCEPTED','IN_PROCESS')";

const LEAD_COLUMNS: &str = "id, customer_name, customer_phone, customer_address, status, team_id, dispatch_type, assigned_closer_id, assigned_closer_name, setter_id, setter_name, setter_location, setter_verified, verified_by, verified_at, scheduled_time, photo_urls, created_at, updated_at, accepted_at";

pub struct SqliteLeadRepository {
    pool: SqlitePool,
}

impl SqliteLeadRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_lead(row: &sqlx::sqlite::SqliteRow) -> DispatchResult<Lead> {
        let photo_urls_json: String = row.try_get("photo_urls")?;
        Ok(Lead {
            id: row.try_get("id")?,
            customer_name: row.try_get("customer_name")?,
            customer_phone: row.try_get("customer_phone")?,
            customer_address: row.try_get("customer_address")?,
            status: row.try_get("status")?,
            team_id: row.try_get("team_id")?,
            dispatch_type: row.try_get("dispatch_type")?,
            assigned_closer_id: row.try_get("assigned_closer_id")?,
            assigned_closer_name: row.try_get("assigned_closer_name")?,
            setter_id: row.try_get("setter_id")?,
            setter_name: row.try_get("setter_name")?,
            setter_location: row.try_get("setter_location")?,
            setter_verified: row.try_get("setter_verified")?,
            verified_by: row.try_get("verified_by")?,
            verified_at: row.try_get("verified_at")?,
            scheduled_time: row.try_get("scheduled_time")?,
            photo_urls: photo_urls_from_json(&photo_urls_json)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            accepted_at: row.try_get("accepted_at")?,
        })
    }
}

#[async_trait]
impl LeadRepository for SqliteLeadRepository {
    async fn create(&self, lead: &Lead) -> DispatchResult<Lead> {
        let photo_urls_json = photo_urls_to_json(&lead.photo_urls)?;
        sqlx::query(
            r#"
            INSERT INTO leads (id, customer_name, customer_phone, customer_address, status, team_id,
                dispatch_type, assigned_closer_id, assigned_closer_name, setter_id, setter_name,
                setter_location, setter_verified, verified_by, verified_at, scheduled_time,
                photo_urls, created_at, updated_at, accepted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            "#,
        )
        .bind(&lead.id)
        .bind(&lead.customer_name)
        .bind(&lead.customer_phone)
        .bind(&lead.customer_address)
        .bind(lead.status)
        .bind(&lead.team_id)
        .bind(lead.dispatch_type)
        .bind(&lead.assigned_closer_id)
        .bind(&lead.assigned_closer_name)
        .bind(&lead.setter_id)
        .bind(&lead.setter_name)
        .bind(&lead.setter_location)
        .bind(lead.setter_verified)
        .bind(&lead.verified_by)
        .bind(lead.verified_at)
        .bind(lead.scheduled_time)
        .bind(photo_urls_json)
        .bind(lead.created_at)
        .bind(lead.updated_at)
        .bind(lead.accepted_at)
        .execute(&self.pool)
        .await
        .map_err(DispatchError::Database)?;

        debug!(lead_id = %lead.id, "线索已写入");
        Ok(lead.clone())
    }

    async fn get_by_id(&self, id: &str) -> DispatchResult<Option<Lead>> {
        let row = sqlx::query(&format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DispatchError::Database)?;
        row.map(|r| Self::row_to_lead(&r)).transpose()
    }

    async fn update(&self, lead: &Lead) -> DispatchResult<()> {
        let photo_urls_json = photo_urls_to_json(&lead.photo_urls)?;
        let result = sqlx::query(
            r#"
            UPDATE leads SET customer_name = $2, customer_phone = $3, customer_address = $4,
                status = $5, team_id = $6, dispatch_type = $7, assigned_closer_id = $8,
                assigned_closer_name = $9, setter_id = $10, setter_name = $11,
                setter_location = $12, setter_verified = $13, verified_by = $14,
                verified_at = $15, scheduled_time = $16, photo_urls = $17, created_at = $18,
                updated_at = $19, accepted_at = $20
            WHERE id = $1
            "#,
        )
        .bind(&lead.id)
        .bind(&lead.customer_name)
        .bind(&lead.customer_phone)
        .bind(&lead.customer_address)
        .bind(lead.status)
        .bind(&lead.team_id)
        .bind(lead.dispatch_type)
        .bind(&lead.assigned_closer_id)
        .bind(&lead.assigned_closer_name)
        .bind(&lead.setter_id)
        .bind(&lead.setter_name)
        .bind(&lead.setter_location)
        .bind(lead.setter_verified)
        .bind(&lead.verified_by)
        .bind(lead.verified_at)
        .bind(lead.scheduled_time)
        .bind(photo_urls_json)
        .bind(lead.created_at)
        .bind(lead.updated_at)
        .bind(lead.accepted_at)
        .execute(&self.pool)
        .await
        .map_err(DispatchError::Database)?;

        if result.rows_affected() == 0 {
            return Err(DispatchError::LeadNotFound {
                id: lead.id.clone(),
            });
        }
        Ok(())
    }

    async fn list_by_team(&self, team_id: &str) -> DispatchResult<Vec<Lead>> {
        let rows = sqlx::query(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads WHERE team_id = $1 ORDER BY created_at DESC"
        ))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DispatchError::Database)?;
        rows.iter().map(Self::row_to_lead).collect()
    }

    async fn list_active_by_closer(&self, closer_id: &str) -> DispatchResult<Vec<Lead>> {
        let rows = sqlx::query(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads WHERE assigned_closer_id = $1 AND status IN {ACTIVE_STATUSES} ORDER BY created_at"
        ))
        .bind(closer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DispatchError::Database)?;
        rows.iter().map(Self::row_to_lead).collect()
    }

    async fn live_assignment_count(&self, closer_id: &str) -> DispatchResult<i64> {
        // 未核验的预约线索不占名额
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as count FROM leads
            WHERE assigned_closer_id = $1
              AND (status IN ('WAITING_ASSIGNMENT','ACCEPTED','IN_PROCESS')
                   OR (status IN ('SCHEDULED','RESCHEDULED') AND setter_verified))
            "#,
        )
        .bind(closer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DispatchError::Database)?;
        Ok(row.try_get("count")?)
    }

    async fn list_pending_appointments(&self) -> DispatchResult<Vec<Lead>> {
        let rows = sqlx::query(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads WHERE status IN ('SCHEDULED','RESCHEDULED') AND scheduled_time IS NOT NULL ORDER BY scheduled_time"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DispatchError::Database)?;
        rows.iter().map(Self::row_to_lead).collect()
    }

    async fn team_stats(&self, team_id: &str) -> DispatchResult<TeamLeadStats> {
        let mut stats = TeamLeadStats::default();

        let status_rows = sqlx::query(
            "SELECT status, COUNT(*) as count FROM leads WHERE team_id = $1 GROUP BY status",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DispatchError::Database)?;
        for row in &status_rows {
            let status: String = row.try_get("status")?;
            let count: i64 = row.try_get("count")?;
            stats.total_leads += count;
            stats.by_status.insert(status, count);
        }

        let closer_rows = sqlx::query(&format!(
            "SELECT assigned_closer_id, COUNT(*) as count FROM leads WHERE team_id = $1 AND assigned_closer_id IS NOT NULL AND status IN {ACTIVE_STATUSES} GROUP BY assigned_closer_id"
        ))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DispatchError::Database)?;
        for row in &closer_rows {
            let closer_id: String = row.try_get("assigned_closer_id")?;
            let count: i64 = row.try_get("count")?;
            stats.by_closer.insert(closer_id, count);
        }

        Ok(stats)
    }
}
