//! Tag aggregate: a coloured label attached to notes and todos.

mod aggregate;
mod commands;
mod events;
mod service;

pub use aggregate::Tag;
pub use commands::*;
pub use events::{TagCreatedData, TagDeletedData, TagEvent, TagRecoloredData, TagRenamedData};
pub use service::TagService;

pub(crate) use events::register_events;

use thiserror::Error;

use crate::validation::TextError;

/// Errors that can occur during tag operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    /// The name failed validation.
    #[error("Invalid tag name: {0}")]
    InvalidName(#[from] TextError),

    /// Colours are `#RRGGBB`.
    #[error("Invalid tag colour {0:?} (expected #RRGGBB)")]
    InvalidColor(String),

    /// The tag has not been created.
    #[error("Tag does not exist")]
    NotCreated,

    /// The tag has been deleted.
    #[error("Tag has been deleted")]
    Deleted,

    /// The command would not change anything.
    #[error("Tag {field} is unchanged")]
    Unchanged { field: &'static str },
}
