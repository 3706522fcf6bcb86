//! Note commands.

use common::AggregateId;

use crate::command::Command;

use super::Note;

/// Command to create a new note.
#[derive(Debug, Clone)]
pub struct CreateNote {
    /// The note ID to create.
    pub note_id: AggregateId,

    pub title: String,

    /// Containing category; None leaves the note uncategorised.
    pub category_id: Option<AggregateId>,
}

impl CreateNote {
    /// Creates a new CreateNote command with a generated note ID.
    pub fn new(title: impl Into<String>, category_id: Option<AggregateId>) -> Self {
        Self {
            note_id: AggregateId::new(),
            title: title.into(),
            category_id,
        }
    }
}

impl Command for CreateNote {
    type Aggregate = Note;

    fn aggregate_id(&self) -> AggregateId {
        self.note_id
    }
}

/// Command to rename a note.
#[derive(Debug, Clone)]
pub struct RenameNote {
    pub note_id: AggregateId,
    pub title: String,
}

impl RenameNote {
    pub fn new(note_id: AggregateId, title: impl Into<String>) -> Self {
        Self {
            note_id,
            title: title.into(),
        }
    }
}

impl Command for RenameNote {
    type Aggregate = Note;

    fn aggregate_id(&self) -> AggregateId {
        self.note_id
    }
}

/// Command to move a note to another category.
#[derive(Debug, Clone)]
pub struct MoveNote {
    pub note_id: AggregateId,
    pub category_id: Option<AggregateId>,
}

impl MoveNote {
    pub fn new(note_id: AggregateId, category_id: Option<AggregateId>) -> Self {
        Self {
            note_id,
            category_id,
        }
    }
}

impl Command for MoveNote {
    type Aggregate = Note;

    fn aggregate_id(&self) -> AggregateId {
        self.note_id
    }
}

/// Command to attach a tag to a note.
#[derive(Debug, Clone)]
pub struct TagNote {
    pub note_id: AggregateId,
    pub tag_id: AggregateId,
}

impl TagNote {
    pub fn new(note_id: AggregateId, tag_id: AggregateId) -> Self {
        Self { note_id, tag_id }
    }
}

impl Command for TagNote {
    type Aggregate = Note;

    fn aggregate_id(&self) -> AggregateId {
        self.note_id
    }
}

/// Command to detach a tag from a note.
#[derive(Debug, Clone)]
pub struct UntagNote {
    pub note_id: AggregateId,
    pub tag_id: AggregateId,
}

impl UntagNote {
    pub fn new(note_id: AggregateId, tag_id: AggregateId) -> Self {
        Self { note_id, tag_id }
    }
}

impl Command for UntagNote {
    type Aggregate = Note;

    fn aggregate_id(&self) -> AggregateId {
        self.note_id
    }
}

/// Command to delete a note.
#[derive(Debug, Clone)]
pub struct DeleteNote {
    pub note_id: AggregateId,
}

impl DeleteNote {
    pub fn new(note_id: AggregateId) -> Self {
        Self { note_id }
    }
}

impl Command for DeleteNote {
    type Aggregate = Note;

    fn aggregate_id(&self) -> AggregateId {
        self.note_id
    }
}
