//! Read access to the materialized views.

mod cache;
mod tag;
mod todo;
mod tree;

use std::time::Duration;

use async_trait::async_trait;
use common::AggregateId;

use crate::Result;
use crate::store::SharedProjectionStore;

pub use cache::{DEFAULT_CACHE_TTL, SnapshotCache};
pub use tag::{TagQueries, TagSearch};
pub use todo::{TodoQueries, TodoSearch};
pub use tree::{TreeQueries, TreeSearch};

/// The query shape shared by every view.
#[async_trait]
pub trait QueryService: Send + Sync {
    type Item: Send + Sync;
    type Child: Send + Sync;
    type Filter: Send + Sync;

    async fn get_all(&self) -> Result<Vec<Self::Item>>;

    async fn get_by_id(&self, id: AggregateId) -> Result<Option<Self::Item>>;

    /// What sits under `parent`; `None` asks for the top level.
    async fn get_children_of(&self, parent: Option<AggregateId>) -> Result<Vec<Self::Child>>;

    async fn search(&self, filter: &Self::Filter) -> Result<Vec<Self::Item>>;

    /// Drops cached rows so the next read sees the tables as they are now.
    async fn invalidate(&self);
}

/// The query services of all views, sharing one projection store.
pub struct QueryServices {
    pub tree: TreeQueries,
    pub tags: TagQueries,
    pub todos: TodoQueries,
}

impl QueryServices {
    pub fn new(store: SharedProjectionStore, ttl: Duration) -> Self {
        Self {
            tree: TreeQueries::new(store.clone(), ttl),
            tags: TagQueries::new(store.clone(), ttl),
            todos: TodoQueries::new(store, ttl),
        }
    }

    pub async fn invalidate_all(&self) {
        self.tree.invalidate().await;
        self.tags.invalidate().await;
        self.todos.invalidate().await;
    }
}
