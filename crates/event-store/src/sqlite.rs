use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use sqlx::{Row, SqliteConnection};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    AggregateId, EventEnvelope, EventId, EventStoreError, Position, Result, Version,
    store::{AppendResult, EventStore, validate_batch},
};

const SCHEMA: &str = include_str!("../../../migrations/events.sql");

const SELECT_COLUMNS: &str = "SELECT position, event_id, stream_id, aggregate_type, event_type, version, timestamp, payload, metadata FROM events";

/// Opens a SQLite pool suitable for the engine's stores.
///
/// `sqlite::memory:` URLs get a single long-lived connection, since every
/// connection to an in-memory database sees its own private database. File
/// databases run in WAL mode so readers work from a snapshot while a batch
/// is being appended.
pub async fn open_pool(url: &str) -> std::result::Result<SqlitePool, sqlx::Error> {
    let in_memory = url.contains(":memory:") || url.contains("mode=memory");
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
    } else {
        SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(
                options
                    .journal_mode(SqliteJournalMode::Wal)
                    .synchronous(SqliteSynchronous::Normal),
            )
            .await
    }
}

/// SQLite-backed event store implementation.
///
/// Appends additionally go through an in-process writer lock, so competing
/// commands in this process queue up instead of racing for SQLite's write
/// lock; the `(stream_id, version)` unique constraint remains the last line
/// of the concurrency check.
#[derive(Clone)]
pub struct SqliteEventStore {
    pool: SqlitePool,
    writer: Arc<Mutex<()>>,
}

impl SqliteEventStore {
    /// Creates a store over an existing pool. Call [`Self::run_migrations`]
    /// before use if the schema may be missing.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Opens (creating if needed) the database at `url` and ensures the schema.
    pub async fn connect(url: &str) -> Result<Self> {
        let store = Self::new(open_pool(url).await?);
        store.run_migrations().await?;
        tracing::debug!(%url, "opened sqlite event store");
        Ok(store)
    }

    /// Opens a private in-memory log.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:").await
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the events table and its guards if they do not exist.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Closes the pool, waiting for in-flight queries.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn row_to_event(row: SqliteRow) -> Result<EventEnvelope> {
        let position: i64 = row.try_get("position")?;
        let corrupt = |reason: String| EventStoreError::CorruptRecord { position, reason };

        let event_id: String = row.try_get("event_id")?;
        let stream_id: String = row.try_get("stream_id")?;
        let payload: String = row.try_get("payload")?;
        let metadata: String = row.try_get("metadata")?;

        Ok(EventEnvelope {
            event_id: EventId::from_uuid(
                Uuid::parse_str(&event_id).map_err(|e| corrupt(format!("event_id: {e}")))?,
            ),
            event_type: row.try_get("event_type")?,
            aggregate_id: AggregateId::from_str(&stream_id)
                .map_err(|e| corrupt(format!("stream_id: {e}")))?,
            aggregate_type: row.try_get("aggregate_type")?,
            version: Version::new(row.try_get("version")?),
            position: Position::new(position as u64),
            timestamp: row.try_get("timestamp")?,
            payload: serde_json::from_str(&payload)
                .map_err(|e| corrupt(format!("payload: {e}")))?,
            metadata: serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&metadata)
                .map_err(|e| corrupt(format!("metadata: {e}")))?,
        })
    }

    async fn current_version(conn: &mut SqliteConnection, stream_id: AggregateId) -> Result<Version> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM events WHERE stream_id = ?1")
                .bind(stream_id.to_string())
                .fetch_one(conn)
                .await?;
        Ok(Version::new(version.unwrap_or(0)))
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn append(
        &self,
        stream_id: AggregateId,
        expected_version: Version,
        events: Vec<EventEnvelope>,
    ) -> Result<AppendResult> {
        validate_batch(stream_id, expected_version, &events)?;

        // Encode everything before touching the database so an encoding
        // failure cannot leave a half-built transaction behind.
        let mut encoded = Vec::with_capacity(events.len());
        for event in &events {
            encoded.push((
                serde_json::to_string(&event.payload)?,
                serde_json::to_string(&event.metadata)?,
            ));
        }

        let _writer = self.writer.lock().await;
        let mut tx = self.pool.begin().await?;

        let actual = Self::current_version(&mut tx, stream_id).await?;
        if actual != expected_version {
            return Err(EventStoreError::ConcurrencyConflict {
                stream_id,
                expected: expected_version,
                actual,
            });
        }

        let mut first_position = None;
        let mut last_position = Position::start();
        for (event, (payload, metadata)) in events.iter().zip(encoded) {
            let result = sqlx::query(
                r#"
                INSERT INTO events (event_id, stream_id, aggregate_type, event_type, version, timestamp, payload, metadata)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(event.event_id.to_string())
            .bind(stream_id.to_string())
            .bind(&event.aggregate_type)
            .bind(&event.event_type)
            .bind(event.version.as_i64())
            .bind(event.timestamp)
            .bind(payload)
            .bind(metadata)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return EventStoreError::ConcurrencyConflict {
                        stream_id,
                        expected: expected_version,
                        actual: event.version,
                    };
                }
                EventStoreError::Database(e)
            })?;

            last_position = Position::new(result.last_insert_rowid() as u64);
            first_position.get_or_insert(last_position);
        }

        tx.commit().await?;
        metrics::counter!("events_appended_total").increment(events.len() as u64);

        Ok(AppendResult {
            version: events
                .last()
                .map(|e| e.version)
                .unwrap_or(expected_version),
            first_position: first_position.unwrap_or(last_position),
            last_position,
        })
    }

    async fn load_events(&self, stream_id: AggregateId) -> Result<Vec<EventEnvelope>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE stream_id = ?1 ORDER BY version ASC"
        ))
        .bind(stream_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_event).collect()
    }

    async fn get_events_since(
        &self,
        after: Position,
        batch_size: usize,
    ) -> Result<Vec<EventEnvelope>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE position > ?1 ORDER BY position ASC LIMIT ?2"
        ))
        .bind(after.as_u64() as i64)
        .bind(batch_size as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_event).collect()
    }

    async fn current_position(&self) -> Result<Position> {
        let position: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(position), 0) FROM events")
            .fetch_one(&self.pool)
            .await?;
        Ok(Position::new(position as u64))
    }

    async fn stream_version(&self, stream_id: AggregateId) -> Result<Option<Version>> {
        let mut conn = self.pool.acquire().await?;
        let version = Self::current_version(&mut conn, stream_id).await?;
        Ok((version > Version::initial()).then_some(version))
    }

    async fn event_count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}
