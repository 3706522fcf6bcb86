//! Domain layer of the notebook.
//!
//! This crate provides the write side of the event-sourced notebook:
//! - Aggregate and DomainEvent traits, and the Changeset holding pending events
//! - The event registry and serializer shared with the projections
//! - Command trait, CommandHandler with bounded conflict retry, and the CommandBus
//! - Note, Category, Tag and TodoItem aggregates with their commands and services

pub mod aggregate;
pub mod bus;
pub mod category;
pub mod command;
pub mod error;
pub mod event;
pub mod note;
mod reference;
pub mod serializer;
pub mod tag;
pub mod todo;
pub mod validation;

pub use aggregate::{Aggregate, Changeset, DomainEvent};
pub use bus::{CommandBus, CommandOutcome, NotebookCommand, NotebookCommandBus};
pub use category::{Category, CategoryError, CategoryEvent, CategoryService};
pub use command::{Command, CommandHandler, CommandResult, RetryPolicy};
pub use error::DomainError;
pub use event::{NotebookEvent, RecordedEvent};
pub use note::{Note, NoteError, NoteEvent, NoteService};
pub use reference::MAX_CATEGORY_DEPTH;
pub use serializer::{EventRegistry, EventSerializer, SerializationError};
pub use tag::{Tag, TagError, TagEvent, TagService};
pub use todo::{Priority, TodoError, TodoEvent, TodoItem, TodoService};
pub use validation::TextError;
