//! Category domain events.

use common::AggregateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::event::NotebookEvent;
use crate::serializer::{EventRegistry, SerializationError};

/// Events that can occur on a category aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CategoryEvent {
    /// Category was created.
    CategoryCreated(CategoryCreatedData),

    /// Category was renamed.
    CategoryRenamed(CategoryRenamedData),

    /// Category was moved under another parent (or to the root).
    CategoryMoved(CategoryMovedData),

    /// Category was deleted.
    CategoryDeleted(CategoryDeletedData),
}

impl CategoryEvent {
    pub const EVENT_TYPES: &'static [&'static str] = &[
        "CategoryCreated",
        "CategoryRenamed",
        "CategoryMoved",
        "CategoryDeleted",
    ];
}

impl DomainEvent for CategoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CategoryEvent::CategoryCreated(_) => "CategoryCreated",
            CategoryEvent::CategoryRenamed(_) => "CategoryRenamed",
            CategoryEvent::CategoryMoved(_) => "CategoryMoved",
            CategoryEvent::CategoryDeleted(_) => "CategoryDeleted",
        }
    }

    fn into_notebook(self) -> NotebookEvent {
        NotebookEvent::Category(self)
    }

    fn from_notebook(event: NotebookEvent) -> Option<Self> {
        match event {
            NotebookEvent::Category(e) => Some(e),
            _ => None,
        }
    }
}

/// Data for CategoryCreated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCreatedData {
    pub category_id: AggregateId,
    pub name: String,
    /// None for a root category.
    pub parent_id: Option<AggregateId>,
}

/// Data for CategoryRenamed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRenamedData {
    pub name: String,
}

/// Data for CategoryMoved event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMovedData {
    pub parent_id: Option<AggregateId>,
}

/// Data for CategoryDeleted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDeletedData {
    pub deleted_at: DateTime<Utc>,
}

// Convenience constructors for events
impl CategoryEvent {
    pub fn category_created(
        category_id: AggregateId,
        name: String,
        parent_id: Option<AggregateId>,
    ) -> Self {
        CategoryEvent::CategoryCreated(CategoryCreatedData {
            category_id,
            name,
            parent_id,
        })
    }

    pub fn category_renamed(name: String) -> Self {
        CategoryEvent::CategoryRenamed(CategoryRenamedData { name })
    }

    pub fn category_moved(parent_id: Option<AggregateId>) -> Self {
        CategoryEvent::CategoryMoved(CategoryMovedData { parent_id })
    }

    pub fn category_deleted() -> Self {
        CategoryEvent::CategoryDeleted(CategoryDeletedData {
            deleted_at: Utc::now(),
        })
    }
}

pub(crate) fn register_events(registry: &mut EventRegistry) -> Result<(), SerializationError> {
    registry.register("CategoryCreated", |payload| {
        Ok(CategoryEvent::CategoryCreated(serde_json::from_value(payload)?).into())
    })?;
    registry.register("CategoryRenamed", |payload| {
        Ok(CategoryEvent::CategoryRenamed(serde_json::from_value(payload)?).into())
    })?;
    registry.register("CategoryMoved", |payload| {
        Ok(CategoryEvent::CategoryMoved(serde_json::from_value(payload)?).into())
    })?;
    registry.register("CategoryDeleted", |payload| {
        Ok(CategoryEvent::CategoryDeleted(serde_json::from_value(payload)?).into())
    })?;
    Ok(())
}
