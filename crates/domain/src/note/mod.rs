//! Note aggregate: a document in the notebook tree.

mod aggregate;
mod commands;
mod events;
mod service;

pub use aggregate::Note;
pub use commands::*;
pub use events::{
    NoteCreatedData, NoteDeletedData, NoteEvent, NoteMovedData, NoteRenamedData, NoteTaggedData,
    NoteUntaggedData,
};
pub use service::NoteService;

pub(crate) use events::register_events;

use common::AggregateId;
use thiserror::Error;

use crate::validation::TextError;

/// Errors that can occur during note operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoteError {
    /// The title failed validation.
    #[error("Invalid note title: {0}")]
    InvalidTitle(#[from] TextError),

    /// The note has not been created.
    #[error("Note does not exist")]
    NotCreated,

    /// The note has been deleted.
    #[error("Note has been deleted")]
    Deleted,

    /// The command would not change anything.
    #[error("Note {field} is unchanged")]
    Unchanged { field: &'static str },

    /// The tag is already on the note.
    #[error("Note is already tagged with {tag_id}")]
    AlreadyTagged { tag_id: AggregateId },

    /// The tag is not on the note.
    #[error("Note is not tagged with {tag_id}")]
    NotTagged { tag_id: AggregateId },
}
