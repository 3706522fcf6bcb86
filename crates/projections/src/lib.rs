//! Read side of the notebook.
//!
//! This crate turns the event log into queryable tables:
//! - [`Projection`] trait and the tree, tag and todo views
//! - [`ProjectionStore`] with in-memory and SQLite storage for rows and checkpoints
//! - [`ProjectionOrchestrator`] for catch-up, rebuild and consistency checks
//! - Cached [`QueryService`]s over each view

pub mod error;
pub mod orchestrator;
pub mod projection;
pub mod query;
pub mod store;
pub mod views;

pub use error::{ProjectionError, Result};
pub use orchestrator::{
    CatchUpReport, ConsistencyReport, DEFAULT_BATCH_SIZE, ProjectionHealth, ProjectionOrchestrator,
    ProjectionStatus,
};
pub use projection::Projection;
pub use query::{
    DEFAULT_CACHE_TTL, QueryService, QueryServices, TagQueries, TagSearch, TodoQueries,
    TodoSearch, TreeQueries, TreeSearch,
};
pub use store::{
    InMemoryProjectionStore, ProjectionStore, ProjectionStoreExt, SharedProjectionStore,
    SqliteProjectionStore, Table,
};
pub use views::{
    EntityKind, EntityTagsRow, NodeKind, TagProjection, TagRow, TodoProjection, TodoRow,
    TreeNode, TreeViewProjection,
};
