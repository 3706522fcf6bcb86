//! Identifiers shared by every layer of the notebook persistence engine.

mod types;

pub use types::AggregateId;
