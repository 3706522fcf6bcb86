use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use common::AggregateId;
use event_store::Position;
use event_store::sqlite::open_pool;
use sqlx::sqlite::SqlitePool;

use super::{ProjectionStore, Table};
use crate::{ProjectionError, Result};

const SCHEMA: &str = include_str!("../../../../migrations/projections.sql");

/// SQLite-backed projection store.
///
/// May share a database file with the event log or live in its own file;
/// the two schemas do not overlap.
#[derive(Clone)]
pub struct SqliteProjectionStore {
    pool: SqlitePool,
}

impl SqliteProjectionStore {
    /// Creates a store over an existing pool. Call [`Self::run_migrations`]
    /// before use if the schema may be missing.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database at `url` and ensures the schema.
    pub async fn connect(url: &str) -> Result<Self> {
        let store = Self::new(open_pool(url).await?);
        store.run_migrations().await?;
        tracing::debug!(%url, "opened sqlite projection store");
        Ok(store)
    }

    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:").await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn parse_row(table: Table, id: &str, row: &str) -> Result<(AggregateId, serde_json::Value)> {
        let corrupt = |reason: String| ProjectionError::CorruptRecord {
            table: table.name(),
            reason,
        };
        let id = AggregateId::from_str(id).map_err(|e| corrupt(format!("id {id}: {e}")))?;
        let row = serde_json::from_str(row).map_err(|e| corrupt(format!("row {id}: {e}")))?;
        Ok((id, row))
    }
}

#[async_trait]
impl ProjectionStore for SqliteProjectionStore {
    async fn get(&self, table: Table, id: AggregateId) -> Result<Option<serde_json::Value>> {
        let row: Option<String> =
            sqlx::query_scalar(&format!("SELECT row FROM {table} WHERE id = ?1"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(|row| Self::parse_row(table, &id.to_string(), &row).map(|(_, value)| value))
            .transpose()
    }

    async fn put(&self, table: Table, id: AggregateId, row: serde_json::Value) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO {table} (id, row) VALUES (?1, ?2) \
             ON CONFLICT(id) DO UPDATE SET row = excluded.row"
        ))
        .bind(id.to_string())
        .bind(serde_json::to_string(&row)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, table: Table, id: AggregateId) -> Result<bool> {
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = ?1"))
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn all(&self, table: Table) -> Result<Vec<(AggregateId, serde_json::Value)>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as(&format!("SELECT id, row FROM {table}"))
                .fetch_all(&self.pool)
                .await?;
        let mut rows = rows
            .iter()
            .map(|(id, row)| Self::parse_row(table, id, row))
            .collect::<Result<Vec<_>>>()?;
        // Text order of a UUID is not its byte order.
        rows.sort_by_key(|(id, _)| *id);
        Ok(rows)
    }

    async fn count(&self, table: Table) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn clear(&self, table: Table) -> Result<()> {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn checkpoint(&self, projection: &str) -> Result<Position> {
        let position: Option<i64> = sqlx::query_scalar(
            "SELECT position FROM projection_checkpoints WHERE projection = ?1",
        )
        .bind(projection)
        .fetch_optional(&self.pool)
        .await?;
        Ok(Position::new(position.unwrap_or(0) as u64))
    }

    async fn save_checkpoint(&self, projection: &str, position: Position) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO projection_checkpoints (projection, position, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(projection) DO UPDATE SET
                position = MAX(position, excluded.position),
                updated_at = excluded.updated_at
            "#,
        )
        .bind(projection)
        .bind(position.as_u64() as i64)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reset_checkpoint(&self, projection: &str) -> Result<()> {
        sqlx::query("DELETE FROM projection_checkpoints WHERE projection = ?1")
            .bind(projection)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
