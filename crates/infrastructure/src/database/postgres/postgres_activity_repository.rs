use async_trait::async_trait;
use lineup_core::{DispatchError, DispatchResult};
use lineup_domain::repositories::ActivityRepository;
use lineup_domain::ActivityRecord;
use sqlx::{PgPool, Row};

pub struct PostgresActivityRepository {
    pool: PgPool,
}

impl PostgresActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &sqlx::postgres::PgRow) -> DispatchResult<ActivityRecord> {
        Ok(ActivityRecord {
            id: row.try_get("id")?,
            kind: row.try_get("kind")?,
            lead_id: row.try_get("lead_id")?,
            closer_id: row.try_get("closer_id")?,
            team_id: row.try_get("team_id")?,
            detail: row.try_get("detail")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl ActivityRepository for PostgresActivityRepository {
    async fn append(&self, record: &ActivityRecord) -> DispatchResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activities (id, kind, lead_id, closer_id, team_id, detail, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&record.id)
        .bind(record.kind)
        .bind(&record.lead_id)
        .bind(&record.closer_id)
        .bind(&record.team_id)
        .bind(&record.detail)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(DispatchError::Database)?;
        Ok(())
    }

    async fn list_recent_by_team(
        &self,
        team_id: &str,
        limit: i64,
    ) -> DispatchResult<Vec<ActivityRecord>> {
        let rows = sqlx::query(
            "SELECT id, kind, lead_id, closer_id, team_id, detail, created_at FROM activities WHERE team_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(team_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(DispatchError::Database)?;
        rows.iter().map(Self::row_to_record).collect()
    }
}
