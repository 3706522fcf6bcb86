//! Domain error types.

use common::AggregateId;
use event_store::EventStoreError;
use thiserror::Error;

use crate::category::CategoryError;
use crate::note::NoteError;
use crate::serializer::SerializationError;
use crate::tag::TagError;
use crate::todo::TodoError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// An event could not be encoded or a stored one decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// The note aggregate rejected the command.
    #[error("Note error: {0}")]
    Note(NoteError),

    /// The category aggregate rejected the command.
    #[error("Category error: {0}")]
    Category(CategoryError),

    /// The tag aggregate rejected the command.
    #[error("Tag error: {0}")]
    Tag(TagError),

    /// The todo aggregate rejected the command.
    #[error("Todo error: {0}")]
    Todo(TodoError),

    /// Aggregate not found.
    #[error("Aggregate not found: {aggregate_type} with id {aggregate_id}")]
    AggregateNotFound {
        aggregate_type: &'static str,
        aggregate_id: AggregateId,
    },

    /// A command pointed at another aggregate that cannot be used.
    #[error("Invalid reference to {aggregate_type} {aggregate_id}: {reason}")]
    InvalidReference {
        aggregate_type: &'static str,
        aggregate_id: AggregateId,
        reason: &'static str,
    },

    /// A stream held an event belonging to a different aggregate family.
    #[error("Stream {aggregate_id} holds a {event_type} event, which is not a {aggregate_type} event")]
    ForeignEvent {
        aggregate_type: &'static str,
        aggregate_id: AggregateId,
        event_type: &'static str,
    },

    /// Every attempt lost the race against a concurrent writer.
    #[error("Concurrency conflict on {aggregate_id} persisted after {attempts} attempts")]
    ConcurrencyConflict {
        aggregate_id: AggregateId,
        attempts: u32,
    },
}

impl DomainError {
    /// Returns true for rejections the user can act on (bad input, missing or
    /// deleted references, invalid state transitions).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::Note(_)
                | DomainError::Category(_)
                | DomainError::Tag(_)
                | DomainError::Todo(_)
                | DomainError::AggregateNotFound { .. }
                | DomainError::InvalidReference { .. }
        )
    }

    /// Returns true for optimistic concurrency failures, whether straight from
    /// the store or after retries were exhausted.
    pub fn is_conflict(&self) -> bool {
        match self {
            DomainError::ConcurrencyConflict { .. } => true,
            DomainError::EventStore(e) => e.is_conflict(),
            _ => false,
        }
    }
}

impl From<NoteError> for DomainError {
    fn from(e: NoteError) -> Self {
        DomainError::Note(e)
    }
}

impl From<CategoryError> for DomainError {
    fn from(e: CategoryError) -> Self {
        DomainError::Category(e)
    }
}

impl From<TagError> for DomainError {
    fn from(e: TagError) -> Self {
        DomainError::Tag(e)
    }
}

impl From<TodoError> for DomainError {
    fn from(e: TodoError) -> Self {
        DomainError::Todo(e)
    }
}
