use async_trait::async_trait;
use lineup_core::{DispatchError, DispatchResult};
use lineup_domain::repositories::CloserRepository;
use lineup_domain::Closer;
use sqlx::{PgPool, Row};
use tracing::debug;

const CLOSER_COLUMNS: &str = "id, name, status, team_id, lineup_order, last_exception_at, last_exception_reason, created_at, updated_at";

pub struct PostgresCloserRepository {
    pool: PgPool,
}

impl PostgresCloserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_closer(row: &sqlx::postgres::PgRow) -> DispatchResult<Closer> {
        Ok(Closer {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            status: row.try_get("status")?,
            team_id: row.try_get("team_id")?,
            lineup_order: row.try_get("lineup_order")?,
            last_exception_at: row.try_get("last_exception_at")?,
            last_exception_reason: row.try_get("last_exception_reason")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl CloserRepository for PostgresCloserRepository {
    async fn create(&self, closer: &Closer) -> DispatchResult<Closer> {
        sqlx::query(
            r#"
            INSERT INTO closers (id, name, status, team_id, lineup_order, last_exception_at,
                last_exception_reason, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&closer.id)
        .bind(&closer.name)
        .bind(closer.status)
        .bind(&closer.team_id)
        .bind(closer.lineup_order)
        .bind(closer.last_exception_at)
        .bind(&closer.last_exception_reason)
        .bind(closer.created_at)
        .bind(closer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DispatchError::Database)?;

        debug!(closer_id = %closer.id, "closer已写入");
        Ok(closer.clone())
    }

    async fn get_by_id(&self, id: &str) -> DispatchResult<Option<Closer>> {
        let row = sqlx::query(&format!(
            "SELECT {CLOSER_COLUMNS} FROM closers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DispatchError::Database)?;
        row.map(|r| Self::row_to_closer(&r)).transpose()
    }

    async fn update(&self, closer: &Closer) -> DispatchResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE closers SET name = $2, status = $3, team_id = $4, lineup_order = $5,
                last_exception_at = $6, last_exception_reason = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(&closer.id)
        .bind(&closer.name)
        .bind(closer.status)
        .bind(&closer.team_id)
        .bind(closer.lineup_order)
        .bind(closer.last_exception_at)
        .bind(&closer.last_exception_reason)
        .bind(closer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DispatchError::Database)?;

        if result.rows_affected() == 0 {
            return Err(DispatchError::CloserNotFound {
                id: closer.id.clone(),
            });
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> DispatchResult<()> {
        let result = sqlx::query("DELETE FROM closers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DispatchError::Database)?;

        if result.rows_affected() == 0 {
            return Err(DispatchError::CloserNotFound { id: id.to_string() });
        }
        Ok(())
    }

    async fn list_by_team(&self, team_id: &str) -> DispatchResult<Vec<Closer>> {
        let rows = sqlx::query(&format!(
            "SELECT {CLOSER_COLUMNS} FROM closers WHERE team_id = $1 ORDER BY name"
        ))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DispatchError::Database)?;
        rows.iter().map(Self::row_to_closer).collect()
    }

    async fn list_on_duty(&self, team_id: &str) -> DispatchResult<Vec<Closer>> {
        let rows = sqlx::query(&format!(
            "SELECT {CLOSER_COLUMNS} FROM closers WHERE team_id = $1 AND status = 'ON_DUTY' ORDER BY name"
        ))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DispatchError::Database)?;
        rows.iter().map(Self::row_to_closer).collect()
    }

    async fn team_orders(&self, team_id: &str) -> DispatchResult<Vec<i64>> {
        let rows = sqlx::query(
            "SELECT lineup_order FROM closers WHERE team_id = $1 AND lineup_order IS NOT NULL",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DispatchError::Database)?;
        rows.iter()
            .map(|r| r.try_get("lineup_order").map_err(DispatchError::Database))
            .collect()
    }

    async fn update_lineup_order(&self, closer_id: &str, order: i64) -> DispatchResult<()> {
        let result =
            sqlx::query("UPDATE closers SET lineup_order = $2, updated_at = $3 WHERE id = $1")
                .bind(closer_id)
                .bind(order)
                .bind(chrono::Utc::now())
                .execute(&self.pool)
                .await
                .map_err(DispatchError::Database)?;

        if result.rows_affected() == 0 {
            return Err(DispatchError::CloserNotFound {
                id: closer_id.to_string(),
            });
        }
        Ok(())
    }
}
