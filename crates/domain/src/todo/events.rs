//! Todo domain events.

use chrono::{DateTime, NaiveDate, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::event::NotebookEvent;
use crate::serializer::{EventRegistry, SerializationError};

use super::Priority;

/// Events that can occur on a todo aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TodoEvent {
    /// Todo was created.
    TodoCreated(TodoCreatedData),

    /// Todo text was edited.
    TodoTextChanged(TodoTextChangedData),

    /// Todo was marked as done.
    TodoCompleted(TodoCompletedData),

    /// A completed todo was marked as not done.
    TodoReopened(TodoReopenedData),

    TodoPriorityChanged(TodoPriorityChangedData),

    TodoDueDateChanged(TodoDueDateChangedData),

    /// Todo was moved to another category.
    TodoMoved(TodoMovedData),

    TodoTagged(TodoTaggedData),

    TodoUntagged(TodoUntaggedData),

    /// Todo was deleted.
    TodoDeleted(TodoDeletedData),
}

impl TodoEvent {
    pub const EVENT_TYPES: &'static [&'static str] = &[
        "TodoCreated",
        "TodoTextChanged",
        "TodoCompleted",
        "TodoReopened",
        "TodoPriorityChanged",
        "TodoDueDateChanged",
        "TodoMoved",
        "TodoTagged",
        "TodoUntagged",
        "TodoDeleted",
    ];
}

impl DomainEvent for TodoEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TodoEvent::TodoCreated(_) => "TodoCreated",
            TodoEvent::TodoTextChanged(_) => "TodoTextChanged",
            TodoEvent::TodoCompleted(_) => "TodoCompleted",
            TodoEvent::TodoReopened(_) => "TodoReopened",
            TodoEvent::TodoPriorityChanged(_) => "TodoPriorityChanged",
            TodoEvent::TodoDueDateChanged(_) => "TodoDueDateChanged",
            TodoEvent::TodoMoved(_) => "TodoMoved",
            TodoEvent::TodoTagged(_) => "TodoTagged",
            TodoEvent::TodoUntagged(_) => "TodoUntagged",
            TodoEvent::TodoDeleted(_) => "TodoDeleted",
        }
    }

    fn into_notebook(self) -> NotebookEvent {
        NotebookEvent::Todo(self)
    }

    fn from_notebook(event: NotebookEvent) -> Option<Self> {
        match event {
            NotebookEvent::Todo(e) => Some(e),
            _ => None,
        }
    }
}

/// Data for TodoCreated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoCreatedData {
    pub todo_id: AggregateId,
    pub text: String,
    pub category_id: Option<AggregateId>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
}

/// Data for TodoTextChanged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoTextChangedData {
    pub text: String,
}

/// Data for TodoCompleted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoCompletedData {
    pub completed_at: DateTime<Utc>,
}

/// Data for TodoReopened event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoReopenedData {
    pub reopened_at: DateTime<Utc>,
}

/// Data for TodoPriorityChanged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPriorityChangedData {
    pub priority: Priority,
}

/// Data for TodoDueDateChanged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoDueDateChangedData {
    /// None clears the due date.
    pub due_date: Option<NaiveDate>,
}

/// Data for TodoMoved event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoMovedData {
    pub category_id: Option<AggregateId>,
}

/// Data for TodoTagged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoTaggedData {
    pub tag_id: AggregateId,
}

/// Data for TodoUntagged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoUntaggedData {
    pub tag_id: AggregateId,
}

/// Data for TodoDeleted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoDeletedData {
    pub deleted_at: DateTime<Utc>,
}

// Convenience constructors for events
impl TodoEvent {
    pub fn todo_created(
        todo_id: AggregateId,
        text: String,
        category_id: Option<AggregateId>,
        priority: Priority,
        due_date: Option<NaiveDate>,
    ) -> Self {
        TodoEvent::TodoCreated(TodoCreatedData {
            todo_id,
            text,
            category_id,
            priority,
            due_date,
        })
    }

    pub fn todo_text_changed(text: String) -> Self {
        TodoEvent::TodoTextChanged(TodoTextChangedData { text })
    }

    pub fn todo_completed() -> Self {
        TodoEvent::TodoCompleted(TodoCompletedData {
            completed_at: Utc::now(),
        })
    }

    pub fn todo_reopened() -> Self {
        TodoEvent::TodoReopened(TodoReopenedData {
            reopened_at: Utc::now(),
        })
    }

    pub fn todo_priority_changed(priority: Priority) -> Self {
        TodoEvent::TodoPriorityChanged(TodoPriorityChangedData { priority })
    }

    pub fn todo_due_date_changed(due_date: Option<NaiveDate>) -> Self {
        TodoEvent::TodoDueDateChanged(TodoDueDateChangedData { due_date })
    }

    pub fn todo_moved(category_id: Option<AggregateId>) -> Self {
        TodoEvent::TodoMoved(TodoMovedData { category_id })
    }

    pub fn todo_tagged(tag_id: AggregateId) -> Self {
        TodoEvent::TodoTagged(TodoTaggedData { tag_id })
    }

    pub fn todo_untagged(tag_id: AggregateId) -> Self {
        TodoEvent::TodoUntagged(TodoUntaggedData { tag_id })
    }

    pub fn todo_deleted() -> Self {
        TodoEvent::TodoDeleted(TodoDeletedData {
            deleted_at: Utc::now(),
        })
    }
}

pub(crate) fn register_events(registry: &mut EventRegistry) -> Result<(), SerializationError> {
    registry.register("TodoCreated", |payload| {
        Ok(TodoEvent::TodoCreated(serde_json::from_value(payload)?).into())
    })?;
    registry.register("TodoTextChanged", |payload| {
        Ok(TodoEvent::TodoTextChanged(serde_json::from_value(payload)?).into())
    })?;
    registry.register("TodoCompleted", |payload| {
        Ok(TodoEvent::TodoCompleted(serde_json::from_value(payload)?).into())
    })?;
    registry.register("TodoReopened", |payload| {
        Ok(TodoEvent::TodoReopened(serde_json::from_value(payload)?).into())
    })?;
    registry.register("TodoPriorityChanged", |payload| {
        Ok(TodoEvent::TodoPriorityChanged(serde_json::from_value(payload)?).into())
    })?;
    registry.register("TodoDueDateChanged", |payload| {
        Ok(TodoEvent::TodoDueDateChanged(serde_json::from_value(payload)?).into())
    })?;
    registry.register("TodoMoved", |payload| {
        Ok(TodoEvent::TodoMoved(serde_json::from_value(payload)?).into())
    })?;
    registry.register("TodoTagged", |payload| {
        Ok(TodoEvent::TodoTagged(serde_json::from_value(payload)?).into())
    })?;
    registry.register("TodoUntagged", |payload| {
        Ok(TodoEvent::TodoUntagged(serde_json::from_value(payload)?).into())
    })?;
    registry.register("TodoDeleted", |payload| {
        Ok(TodoEvent::TodoDeleted(serde_json::from_value(payload)?).into())
    })?;
    Ok(())
}
