//! The notebook-wide event sum type and its recorded form.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::{Position, Version};
use serde::Serialize;

use crate::aggregate::{Aggregate, DomainEvent};
use crate::category::{Category, CategoryEvent};
use crate::note::{Note, NoteEvent};
use crate::tag::{Tag, TagEvent};
use crate::todo::{TodoEvent, TodoItem};

/// Any event the notebook records, grouped by aggregate family.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NotebookEvent {
    Note(NoteEvent),
    Category(CategoryEvent),
    Tag(TagEvent),
    Todo(TodoEvent),
}

impl NotebookEvent {
    /// Returns the registered event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            NotebookEvent::Note(e) => e.event_type(),
            NotebookEvent::Category(e) => e.event_type(),
            NotebookEvent::Tag(e) => e.event_type(),
            NotebookEvent::Todo(e) => e.event_type(),
        }
    }

    /// Returns the type of aggregate whose stream holds this event.
    pub fn aggregate_type(&self) -> &'static str {
        match self {
            NotebookEvent::Note(_) => Note::aggregate_type(),
            NotebookEvent::Category(_) => Category::aggregate_type(),
            NotebookEvent::Tag(_) => Tag::aggregate_type(),
            NotebookEvent::Todo(_) => TodoItem::aggregate_type(),
        }
    }
}

impl From<NoteEvent> for NotebookEvent {
    fn from(event: NoteEvent) -> Self {
        NotebookEvent::Note(event)
    }
}

impl From<CategoryEvent> for NotebookEvent {
    fn from(event: CategoryEvent) -> Self {
        NotebookEvent::Category(event)
    }
}

impl From<TagEvent> for NotebookEvent {
    fn from(event: TagEvent) -> Self {
        NotebookEvent::Tag(event)
    }
}

impl From<TodoEvent> for NotebookEvent {
    fn from(event: TodoEvent) -> Self {
        NotebookEvent::Todo(event)
    }
}

/// A decoded event as read back from the log.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    /// Global position in the log.
    pub position: Position,

    /// The stream (aggregate) the event belongs to.
    pub stream_id: AggregateId,

    /// Version of the stream after this event.
    pub version: Version,

    /// When the event was appended.
    pub timestamp: DateTime<Utc>,

    /// The typed event.
    pub event: NotebookEvent,
}

impl RecordedEvent {
    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}
