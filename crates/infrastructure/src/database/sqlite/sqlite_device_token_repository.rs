use async_trait::async_trait;
use chrono::Utc;
use lineup_core::{DispatchError, DispatchResult};
use lineup_domain::repositories::DeviceTokenRepository;
use sqlx::{Row, SqlitePool};

pub struct SqliteDeviceTokenRepository {
    pool: SqlitePool,
}

impl SqliteDeviceTokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceTokenRepository for SqliteDeviceTokenRepository {
    async fn add(&self, closer_id: &str, token: &str) -> DispatchResult<()> {
        sqlx::query(
            r#"
            INSERT INTO device_tokens (closer_id, token, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT(closer_id, token) DO NOTHING
            "#,
        )
        .bind(closer_id)
        .bind(token)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(DispatchError::Database)?;
        Ok(())
    }

    async fn remove(&self, closer_id: &str, token: &str) -> DispatchResult<()> {
        sqlx::query("DELETE FROM device_tokens WHERE closer_id = $1 AND token = $2")
            .bind(closer_id)
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(DispatchError::Database)?;
        Ok(())
    }

    async fn tokens_for(&self, closer_id: &str) -> DispatchResult<Vec<String>> {
        let rows = sqlx::query("SELECT token FROM device_tokens WHERE closer_id = $1")
            .bind(closer_id)
            .fetch_all(&self.pool)
            .await
            .map_err(DispatchError::Database)?;
        rows.iter()
            .map(|r| r.try_get("token").map_err(DispatchError::Database))
            .collect()
    }

    async fn remove_tokens(&self, tokens: &[String]) -> DispatchResult<()> {
        if tokens.is_empty() {
            return Ok(());
        }
        let placeholders: Vec<String> = (0..tokens.len()).map(|i| format!("${}", i + 1)).collect();
        let sql = format!(
            "DELETE FROM device_tokens WHERE token IN ({})",
            placeholders.join(", ")
        );
        let mut query = sqlx::query(&sql);
        for token in tokens {
            query = query.bind(token);
        }
        query
            .execute(&self.pool)
            .await
            .map_err(DispatchError::Database)?;
        Ok(())
    }
}
