//! Projection error types.

use thiserror::Error;

/// Errors that can occur during projection processing.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] event_store::EventStoreError),

    /// A projection table could not be read or written.
    #[error("Projection storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// A stored row did not match the shape of its table.
    #[error("Row serialization error: {0}")]
    Row(#[from] serde_json::Error),

    /// A stored record could not be read back.
    #[error("Corrupt projection record in {table}: {reason}")]
    CorruptRecord { table: &'static str, reason: String },

    /// No projection is registered under this name.
    #[error("Unknown projection: {0}")]
    UnknownProjection(String),
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
