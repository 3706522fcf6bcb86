//! Core projection trait and the row-update rules shared by the views.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::RecordedEvent;
use event_store::{Position, Version};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Result;
use crate::store::{ProjectionStoreExt, SharedProjectionStore, Table};

/// A projection folds events from the log into its own tables.
///
/// `apply` must be idempotent: after a crash the orchestrator may deliver
/// events again that were applied but not yet checkpointed.
#[async_trait]
pub trait Projection: Send + Sync {
    /// Returns the name of this projection. Also the checkpoint key.
    fn name(&self) -> &'static str;

    /// Event types this projection reacts to.
    fn relevant_event_types(&self) -> &'static [&'static str];

    /// Tables this projection owns and clears on rebuild.
    fn tables(&self) -> &'static [Table];

    /// The store holding the projection's tables and checkpoint.
    fn store(&self) -> &SharedProjectionStore;

    /// Handles a single event, updating the projection's tables.
    async fn apply(&self, event: &RecordedEvent) -> Result<()>;

    /// The same projection writing into another store.
    fn shadow(&self, store: SharedProjectionStore) -> Box<dyn Projection>;

    fn is_relevant(&self, event_type: &str) -> bool {
        self.relevant_event_types().contains(&event_type)
    }

    async fn checkpoint(&self) -> Result<Position> {
        self.store().checkpoint(self.name()).await
    }

    async fn save_checkpoint(&self, position: Position) -> Result<()> {
        self.store().save_checkpoint(self.name(), position).await
    }

    /// Clears the projection's tables and resets its checkpoint. The event
    /// log is never touched.
    async fn rebuild(&self) -> Result<()> {
        for table in self.tables() {
            self.store().clear(*table).await?;
        }
        self.store().reset_checkpoint(self.name()).await
    }

    async fn row_count(&self) -> Result<u64> {
        let mut total = 0;
        for table in self.tables() {
            total += self.store().count(*table).await?;
        }
        Ok(total)
    }

    /// Canonical text of every row, table by table, for comparisons.
    async fn snapshot_rows(&self) -> Result<Vec<(Table, Vec<(AggregateId, String)>)>> {
        let mut snapshot = Vec::with_capacity(self.tables().len());
        for table in self.tables() {
            snapshot.push((*table, self.store().dump(*table).await?));
        }
        Ok(snapshot)
    }
}

/// A materialized row stamped with the stream version that last wrote it.
pub(crate) trait ViewRow: Serialize + DeserializeOwned + Send + Sync {
    fn version(&self) -> Version;

    fn stamp(&mut self, version: Version, at: DateTime<Utc>);
}

/// Inserts the row a creation event describes, unless it is already there.
pub(crate) async fn insert_row<R: ViewRow>(
    store: &SharedProjectionStore,
    table: Table,
    id: AggregateId,
    row: R,
) -> Result<()> {
    if store.get(table, id).await?.is_some() {
        tracing::debug!(%table, %id, "row already created");
        return Ok(());
    }
    store.put_row(table, id, &row).await
}

/// Applies `update` to an existing row, stamping it with the event's version.
///
/// A missing row is logged and skipped. A row already at or past the event's
/// version has seen this event and is left alone.
pub(crate) async fn update_row<R, F>(
    store: &SharedProjectionStore,
    projection: &'static str,
    table: Table,
    id: AggregateId,
    event: &RecordedEvent,
    update: F,
) -> Result<()>
where
    R: ViewRow,
    F: FnOnce(&mut R) + Send,
{
    let Some(mut row) = store.get_row::<R>(table, id).await? else {
        skip_missing(projection, table, id, event);
        return Ok(());
    };
    if row.version() >= event.version {
        tracing::debug!(%table, %id, version = %event.version, "event already applied");
        return Ok(());
    }
    update(&mut row);
    row.stamp(event.version, event.timestamp);
    store.put_row(table, id, &row).await
}

/// Removes a row, logging and skipping when it is already gone.
pub(crate) async fn remove_row(
    store: &SharedProjectionStore,
    projection: &'static str,
    table: Table,
    id: AggregateId,
    event: &RecordedEvent,
) -> Result<()> {
    if !store.delete(table, id).await? {
        skip_missing(projection, table, id, event);
    }
    Ok(())
}

pub(crate) fn skip_missing(
    projection: &'static str,
    table: Table,
    id: AggregateId,
    event: &RecordedEvent,
) {
    tracing::warn!(
        projection,
        %table,
        %id,
        event_type = event.event_type(),
        position = %event.position,
        "target row missing, event skipped"
    );
    metrics::counter!("projection_events_skipped_total", "projection" => projection, "reason" => "missing_row")
        .increment(1);
}
