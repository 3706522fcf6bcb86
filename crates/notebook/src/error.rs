//! Application-level error type.

use domain::{DomainError, SerializationError};
use event_store::EventStoreError;
use projections::ProjectionError;
use thiserror::Error;

/// Errors raised while wiring or running the notebook.
#[derive(Debug, Error)]
pub enum NotebookError {
    #[error("event store error: {0}")]
    EventStore(#[from] EventStoreError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),

    #[error("event registry error: {0}")]
    Serialization(#[from] SerializationError),

    /// A global tracing subscriber was already installed.
    #[error("telemetry init failed: {0}")]
    Telemetry(String),

    /// The background catch-up task panicked or was aborted.
    #[error("background catch-up task failed: {0}")]
    Background(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, NotebookError>;
