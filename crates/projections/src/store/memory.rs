use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use common::AggregateId;
use event_store::Position;
use tokio::sync::RwLock;

use super::{ProjectionStore, Table};
use crate::Result;

type Rows = BTreeMap<AggregateId, serde_json::Value>;

/// In-memory projection store.
///
/// Used for tests, for throwaway sessions, and as the scratch store the
/// consistency check replays into.
#[derive(Clone, Default)]
pub struct InMemoryProjectionStore {
    tables: Arc<RwLock<HashMap<Table, Rows>>>,
    checkpoints: Arc<RwLock<HashMap<String, Position>>>,
}

impl InMemoryProjectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectionStore for InMemoryProjectionStore {
    async fn get(&self, table: Table, id: AggregateId) -> Result<Option<serde_json::Value>> {
        let tables = self.tables.read().await;
        Ok(tables.get(&table).and_then(|rows| rows.get(&id)).cloned())
    }

    async fn put(&self, table: Table, id: AggregateId, row: serde_json::Value) -> Result<()> {
        self.tables
            .write()
            .await
            .entry(table)
            .or_default()
            .insert(id, row);
        Ok(())
    }

    async fn delete(&self, table: Table, id: AggregateId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .get_mut(&table)
            .is_some_and(|rows| rows.remove(&id).is_some()))
    }

    async fn all(&self, table: Table) -> Result<Vec<(AggregateId, serde_json::Value)>> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table)
            .map(|rows| rows.iter().map(|(id, row)| (*id, row.clone())).collect())
            .unwrap_or_default())
    }

    async fn count(&self, table: Table) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables.get(&table).map_or(0, |rows| rows.len() as u64))
    }

    async fn clear(&self, table: Table) -> Result<()> {
        self.tables.write().await.remove(&table);
        Ok(())
    }

    async fn checkpoint(&self, projection: &str) -> Result<Position> {
        let checkpoints = self.checkpoints.read().await;
        Ok(checkpoints
            .get(projection)
            .copied()
            .unwrap_or(Position::start()))
    }

    async fn save_checkpoint(&self, projection: &str, position: Position) -> Result<()> {
        let mut checkpoints = self.checkpoints.write().await;
        let entry = checkpoints
            .entry(projection.to_string())
            .or_insert(Position::start());
        *entry = (*entry).max(position);
        Ok(())
    }

    async fn reset_checkpoint(&self, projection: &str) -> Result<()> {
        self.checkpoints.write().await.remove(projection);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ProjectionStoreExt;

    #[tokio::test]
    async fn rows_are_listed_in_id_order() {
        let store = InMemoryProjectionStore::new();
        let mut ids: Vec<AggregateId> = (0..5).map(|_| AggregateId::new()).collect();
        for id in &ids {
            store
                .put(Table::Todos, *id, serde_json::json!({"id": id}))
                .await
                .unwrap();
        }
        ids.sort();

        let listed: Vec<AggregateId> = store
            .all(Table::Todos)
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(listed, ids);
        assert_eq!(store.count(Table::Tags).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn dump_is_canonical() {
        let store = InMemoryProjectionStore::new();
        let id = AggregateId::new();
        store
            .put(Table::Tags, id, serde_json::json!({"b": 1, "a": 2}))
            .await
            .unwrap();

        let dump = store.dump(Table::Tags).await.unwrap();
        assert_eq!(dump, vec![(id, r#"{"a":2,"b":1}"#.to_string())]);
    }

    #[tokio::test]
    async fn checkpoints_never_move_backwards_until_reset() {
        let store = InMemoryProjectionStore::new();
        assert_eq!(store.checkpoint("tree").await.unwrap(), Position::start());

        store.save_checkpoint("tree", Position::new(7)).await.unwrap();
        store.save_checkpoint("tree", Position::new(3)).await.unwrap();
        assert_eq!(store.checkpoint("tree").await.unwrap(), Position::new(7));

        store.reset_checkpoint("tree").await.unwrap();
        assert_eq!(store.checkpoint("tree").await.unwrap(), Position::start());
    }
}
