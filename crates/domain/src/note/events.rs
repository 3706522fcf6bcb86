//! Note domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::event::NotebookEvent;
use crate::serializer::{EventRegistry, SerializationError};

/// Events that can occur on a note aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NoteEvent {
    /// Note was created.
    NoteCreated(NoteCreatedData),

    /// Note was renamed.
    NoteRenamed(NoteRenamedData),

    /// Note was moved to another category.
    NoteMoved(NoteMovedData),

    /// A tag was attached to the note.
    NoteTagged(NoteTaggedData),

    /// A tag was detached from the note.
    NoteUntagged(NoteUntaggedData),

    /// Note was deleted.
    NoteDeleted(NoteDeletedData),
}

impl NoteEvent {
    pub const EVENT_TYPES: &'static [&'static str] = &[
        "NoteCreated",
        "NoteRenamed",
        "NoteMoved",
        "NoteTagged",
        "NoteUntagged",
        "NoteDeleted",
    ];
}

impl DomainEvent for NoteEvent {
    fn event_type(&self) -> &'static str {
        match self {
            NoteEvent::NoteCreated(_) => "NoteCreated",
            NoteEvent::NoteRenamed(_) => "NoteRenamed",
            NoteEvent::NoteMoved(_) => "NoteMoved",
            NoteEvent::NoteTagged(_) => "NoteTagged",
            NoteEvent::NoteUntagged(_) => "NoteUntagged",
            NoteEvent::NoteDeleted(_) => "NoteDeleted",
        }
    }

    fn into_notebook(self) -> NotebookEvent {
        NotebookEvent::Note(self)
    }

    fn from_notebook(event: NotebookEvent) -> Option<Self> {
        match event {
            NotebookEvent::Note(e) => Some(e),
            _ => None,
        }
    }
}

/// Data for NoteCreated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteCreatedData {
    /// The unique note ID.
    pub note_id: AggregateId,

    /// Title, which is also the note's file name.
    pub title: String,

    /// Containing category; None for an uncategorised note.
    pub category_id: Option<AggregateId>,
}

/// Data for NoteRenamed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRenamedData {
    pub title: String,
}

/// Data for NoteMoved event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteMovedData {
    pub category_id: Option<AggregateId>,
}

/// Data for NoteTagged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteTaggedData {
    pub tag_id: AggregateId,
}

/// Data for NoteUntagged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteUntaggedData {
    pub tag_id: AggregateId,
}

/// Data for NoteDeleted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDeletedData {
    pub deleted_at: DateTime<Utc>,
}

// Convenience constructors for events
impl NoteEvent {
    pub fn note_created(note_id: AggregateId, title: String, category_id: Option<AggregateId>) -> Self {
        NoteEvent::NoteCreated(NoteCreatedData {
            note_id,
            title,
            category_id,
        })
    }

    pub fn note_renamed(title: String) -> Self {
        NoteEvent::NoteRenamed(NoteRenamedData { title })
    }

    pub fn note_moved(category_id: Option<AggregateId>) -> Self {
        NoteEvent::NoteMoved(NoteMovedData { category_id })
    }

    pub fn note_tagged(tag_id: AggregateId) -> Self {
        NoteEvent::NoteTagged(NoteTaggedData { tag_id })
    }

    pub fn note_untagged(tag_id: AggregateId) -> Self {
        NoteEvent::NoteUntagged(NoteUntaggedData { tag_id })
    }

    pub fn note_deleted() -> Self {
        NoteEvent::NoteDeleted(NoteDeletedData {
            deleted_at: Utc::now(),
        })
    }
}

pub(crate) fn register_events(registry: &mut EventRegistry) -> Result<(), SerializationError> {
    registry.register("NoteCreated", |payload| {
        Ok(NoteEvent::NoteCreated(serde_json::from_value(payload)?).into())
    })?;
    registry.register("NoteRenamed", |payload| {
        Ok(NoteEvent::NoteRenamed(serde_json::from_value(payload)?).into())
    })?;
    registry.register("NoteMoved", |payload| {
        Ok(NoteEvent::NoteMoved(serde_json::from_value(payload)?).into())
    })?;
    registry.register("NoteTagged", |payload| {
        Ok(NoteEvent::NoteTagged(serde_json::from_value(payload)?).into())
    })?;
    registry.register("NoteUntagged", |payload| {
        Ok(NoteEvent::NoteUntagged(serde_json::from_value(payload)?).into())
    })?;
    registry.register("NoteDeleted", |payload| {
        Ok(NoteEvent::NoteDeleted(serde_json::from_value(payload)?).into())
    })?;
    Ok(())
}
