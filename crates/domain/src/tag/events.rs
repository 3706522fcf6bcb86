//! Tag domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::event::NotebookEvent;
use crate::serializer::{EventRegistry, SerializationError};

/// Events that can occur on a tag aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TagEvent {
    TagCreated(TagCreatedData),
    TagRenamed(TagRenamedData),
    TagRecolored(TagRecoloredData),
    TagDeleted(TagDeletedData),
}

impl TagEvent {
    pub const EVENT_TYPES: &'static [&'static str] =
        &["TagCreated", "TagRenamed", "TagRecolored", "TagDeleted"];
}

impl DomainEvent for TagEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TagEvent::TagCreated(_) => "TagCreated",
            TagEvent::TagRenamed(_) => "TagRenamed",
            TagEvent::TagRecolored(_) => "TagRecolored",
            TagEvent::TagDeleted(_) => "TagDeleted",
        }
    }

    fn into_notebook(self) -> NotebookEvent {
        NotebookEvent::Tag(self)
    }

    fn from_notebook(event: NotebookEvent) -> Option<Self> {
        match event {
            NotebookEvent::Tag(e) => Some(e),
            _ => None,
        }
    }
}

/// Data for TagCreated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCreatedData {
    pub tag_id: AggregateId,
    pub name: String,
    pub color: Option<String>,
}

/// Data for TagRenamed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRenamedData {
    pub name: String,
}

/// Data for TagRecolored event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecoloredData {
    /// None removes the colour.
    pub color: Option<String>,
}

/// Data for TagDeleted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDeletedData {
    pub deleted_at: DateTime<Utc>,
}

// Convenience constructors for events
impl TagEvent {
    pub fn tag_created(tag_id: AggregateId, name: String, color: Option<String>) -> Self {
        TagEvent::TagCreated(TagCreatedData {
            tag_id,
            name,
            color,
        })
    }

    pub fn tag_renamed(name: String) -> Self {
        TagEvent::TagRenamed(TagRenamedData { name })
    }

    pub fn tag_recolored(color: Option<String>) -> Self {
        TagEvent::TagRecolored(TagRecoloredData { color })
    }

    pub fn tag_deleted() -> Self {
        TagEvent::TagDeleted(TagDeletedData {
            deleted_at: Utc::now(),
        })
    }
}

pub(crate) fn register_events(registry: &mut EventRegistry) -> Result<(), SerializationError> {
    registry.register("TagCreated", |payload| {
        Ok(TagEvent::TagCreated(serde_json::from_value(payload)?).into())
    })?;
    registry.register("TagRenamed", |payload| {
        Ok(TagEvent::TagRenamed(serde_json::from_value(payload)?).into())
    })?;
    registry.register("TagRecolored", |payload| {
        Ok(TagEvent::TagRecolored(serde_json::from_value(payload)?).into())
    })?;
    registry.register("TagDeleted", |payload| {
        Ok(TagEvent::TagDeleted(serde_json::from_value(payload)?).into())
    })?;
    Ok(())
}
