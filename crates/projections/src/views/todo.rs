//! Todo view: one row per live todo.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::AggregateId;
use domain::{NotebookEvent, Priority, RecordedEvent, TagEvent, TodoEvent};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::projection::{Projection, ViewRow, insert_row, remove_row, update_row};
use crate::store::{ProjectionStoreExt, SharedProjectionStore, Table};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoRow {
    pub todo_id: AggregateId,
    pub text: String,
    pub category_id: Option<AggregateId>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub tag_ids: BTreeSet<AggregateId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: Version,
}

impl ViewRow for TodoRow {
    fn version(&self) -> Version {
        self.version
    }

    fn stamp(&mut self, version: Version, at: DateTime<Utc>) {
        self.version = version;
        self.updated_at = at;
    }
}

/// Projection maintaining `todos`. Deleting a todo removes its row.
#[derive(Clone)]
pub struct TodoProjection {
    store: SharedProjectionStore,
}

impl TodoProjection {
    pub const NAME: &'static str = "todos";

    const EVENT_TYPES: &'static [&'static str] = &[
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
        "TagDeleted",
    ];

    pub fn new(store: SharedProjectionStore) -> Self {
        Self { store }
    }

    async fn update<F>(&self, event: &RecordedEvent, update: F) -> Result<()>
    where
        F: FnOnce(&mut TodoRow) + Send,
    {
        update_row(
            &self.store,
            Self::NAME,
            Table::Todos,
            event.stream_id,
            event,
            update,
        )
        .await
    }

    async fn unlink_tag(&self, tag_id: AggregateId) -> Result<()> {
        let rows: Vec<TodoRow> = self.store.all_rows(Table::Todos).await?;
        for mut row in rows {
            if row.tag_ids.remove(&tag_id) {
                self.store.put_row(Table::Todos, row.todo_id, &row).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Projection for TodoProjection {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn relevant_event_types(&self) -> &'static [&'static str] {
        Self::EVENT_TYPES
    }

    fn tables(&self) -> &'static [Table] {
        &[Table::Todos]
    }

    fn store(&self) -> &SharedProjectionStore {
        &self.store
    }

    fn shadow(&self, store: SharedProjectionStore) -> Box<dyn Projection> {
        Box::new(Self::new(store))
    }

    async fn apply(&self, event: &RecordedEvent) -> Result<()> {
        let todo = match &event.event {
            NotebookEvent::Todo(todo) => todo,
            NotebookEvent::Tag(TagEvent::TagDeleted(_)) => {
                return self.unlink_tag(event.stream_id).await;
            }
            _ => return Ok(()),
        };

        match todo {
            TodoEvent::TodoCreated(data) => {
                let row = TodoRow {
                    todo_id: event.stream_id,
                    text: data.text.clone(),
                    category_id: data.category_id,
                    priority: data.priority,
                    due_date: data.due_date,
                    completed: false,
                    completed_at: None,
                    tag_ids: BTreeSet::new(),
                    created_at: event.timestamp,
                    updated_at: event.timestamp,
                    version: event.version,
                };
                insert_row(&self.store, Table::Todos, event.stream_id, row).await
            }
            TodoEvent::TodoTextChanged(data) => {
                self.update(event, |row| row.text = data.text.clone()).await
            }
            TodoEvent::TodoCompleted(data) => {
                self.update(event, |row| {
                    row.completed = true;
                    row.completed_at = Some(data.completed_at);
                })
                .await
            }
            TodoEvent::TodoReopened(_) => {
                self.update(event, |row| {
                    row.completed = false;
                    row.completed_at = None;
                })
                .await
            }
            TodoEvent::TodoPriorityChanged(data) => {
                self.update(event, |row| row.priority = data.priority).await
            }
            TodoEvent::TodoDueDateChanged(data) => {
                self.update(event, |row| row.due_date = data.due_date).await
            }
            TodoEvent::TodoMoved(data) => {
                self.update(event, |row| row.category_id = data.category_id)
                    .await
            }
            TodoEvent::TodoTagged(data) => {
                self.update(event, |row| {
                    row.tag_ids.insert(data.tag_id);
                })
                .await
            }
            TodoEvent::TodoUntagged(data) => {
                self.update(event, |row| {
                    row.tag_ids.remove(&data.tag_id);
                })
                .await
            }
            TodoEvent::TodoDeleted(_) => {
                remove_row(&self.store, Self::NAME, Table::Todos, event.stream_id, event).await
            }
        }
    }
}
