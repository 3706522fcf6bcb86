//! TodoItem aggregate: a checklist entry with priority and due date.

mod aggregate;
mod commands;
mod events;
mod priority;
mod service;

pub use aggregate::TodoItem;
pub use commands::*;
pub use events::{
    TodoCompletedData, TodoCreatedData, TodoDeletedData, TodoDueDateChangedData, TodoEvent,
    TodoMovedData, TodoPriorityChangedData, TodoReopenedData, TodoTaggedData,
    TodoTextChangedData, TodoUntaggedData,
};
pub use priority::Priority;
pub use service::TodoService;

pub(crate) use events::register_events;

use common::AggregateId;
use thiserror::Error;

use crate::validation::TextError;

/// Errors that can occur during todo operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TodoError {
    /// The text failed validation.
    #[error("Invalid todo text: {0}")]
    InvalidText(#[from] TextError),

    /// Priority levels run from 0 (low) to 3 (urgent).
    #[error("Invalid priority level {0} (expected 0 to 3)")]
    InvalidPriority(u8),

    /// The todo has not been created.
    #[error("Todo does not exist")]
    NotCreated,

    /// The todo has been deleted.
    #[error("Todo has been deleted")]
    Deleted,

    #[error("Todo is already completed")]
    AlreadyCompleted,

    #[error("Todo is not completed")]
    NotCompleted,

    /// The command would not change anything.
    #[error("Todo {field} is unchanged")]
    Unchanged { field: &'static str },

    #[error("Todo is already tagged with {tag_id}")]
    AlreadyTagged { tag_id: AggregateId },

    #[error("Todo is not tagged with {tag_id}")]
    NotTagged { tag_id: AggregateId },
}
