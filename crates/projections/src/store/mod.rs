//! Storage for materialized rows and projection checkpoints.
//!
//! Rows are stored as JSON keyed by entity id. Serializing a row through
//! `serde_json::Value` sorts its keys, so two rows with equal content always
//! have the same text; the consistency check relies on that.

mod memory;
mod sqlite;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use common::AggregateId;
use event_store::Position;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Result;

pub use memory::InMemoryProjectionStore;
pub use sqlite::SqliteProjectionStore;

/// A materialized table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    TreeNodes,
    Tags,
    EntityTags,
    Todos,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::TreeNodes,
        Table::Tags,
        Table::EntityTags,
        Table::Todos,
    ];

    /// The SQL table name.
    pub fn name(&self) -> &'static str {
        match self {
            Table::TreeNodes => "tree_nodes",
            Table::Tags => "tags",
            Table::EntityTags => "entity_tags",
            Table::Todos => "todos",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Row and checkpoint storage shared by all projections.
#[async_trait]
pub trait ProjectionStore: Send + Sync {
    async fn get(&self, table: Table, id: AggregateId) -> Result<Option<serde_json::Value>>;

    /// Inserts or replaces a row.
    async fn put(&self, table: Table, id: AggregateId, row: serde_json::Value) -> Result<()>;

    /// Removes a row, returning whether it existed.
    async fn delete(&self, table: Table, id: AggregateId) -> Result<bool>;

    /// Every row of a table, ordered by id.
    async fn all(&self, table: Table) -> Result<Vec<(AggregateId, serde_json::Value)>>;

    async fn count(&self, table: Table) -> Result<u64>;

    /// Removes every row of a table.
    async fn clear(&self, table: Table) -> Result<()>;

    /// The last position a projection has applied; `Position::start()` if it
    /// has never run.
    async fn checkpoint(&self, projection: &str) -> Result<Position>;

    /// Records progress. Checkpoints never move backwards through this call.
    async fn save_checkpoint(&self, projection: &str, position: Position) -> Result<()>;

    /// Forgets a projection's progress, for a rebuild.
    async fn reset_checkpoint(&self, projection: &str) -> Result<()>;
}

/// Shared handle to a projection store.
pub type SharedProjectionStore = Arc<dyn ProjectionStore>;

/// Typed row access on top of [`ProjectionStore`].
#[async_trait]
pub trait ProjectionStoreExt: ProjectionStore {
    async fn get_row<R>(&self, table: Table, id: AggregateId) -> Result<Option<R>>
    where
        R: DeserializeOwned + Send,
    {
        match self.get(table, id).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn put_row<R>(&self, table: Table, id: AggregateId, row: &R) -> Result<()>
    where
        R: Serialize + Sync,
    {
        self.put(table, id, serde_json::to_value(row)?).await
    }

    async fn all_rows<R>(&self, table: Table) -> Result<Vec<R>>
    where
        R: DeserializeOwned + Send,
    {
        self.all(table)
            .await?
            .into_iter()
            .map(|(_, value)| serde_json::from_value(value).map_err(Into::into))
            .collect()
    }

    /// Every row of a table as canonical JSON text, ordered by id.
    async fn dump(&self, table: Table) -> Result<Vec<(AggregateId, String)>> {
        self.all(table)
            .await?
            .into_iter()
            .map(|(id, value)| Ok((id, serde_json::to_string(&value)?)))
            .collect()
    }
}

impl<T: ProjectionStore + ?Sized> ProjectionStoreExt for T {}
