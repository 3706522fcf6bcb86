//! Durable, ordered, append-only storage of events.
//!
//! Events are grouped into per-aggregate streams (versioned from 1) and carry
//! a global position that totally orders every event in the log:
//! - [`EventStore`] trait with optimistic-concurrency appends
//! - [`InMemoryEventStore`] for tests and throwaway sessions
//! - [`SqliteEventStore`] for the durable desktop log

pub mod error;
pub mod event;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Position, Version};
pub use memory::InMemoryEventStore;
pub use sqlite::SqliteEventStore;
pub use store::{AppendResult, EventStore, EventStoreExt, EventStream};
