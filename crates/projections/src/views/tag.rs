//! Tag view: tags and which notes and todos carry them.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{NotebookEvent, NoteEvent, RecordedEvent, TagEvent, TodoEvent};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::projection::{Projection, ViewRow, insert_row, remove_row, update_row};
use crate::store::{ProjectionStoreExt, SharedProjectionStore, Table};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRow {
    pub tag_id: AggregateId,
    pub name: String,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: Version,
}

impl ViewRow for TagRow {
    fn version(&self) -> Version {
        self.version
    }

    fn stamp(&mut self, version: Version, at: DateTime<Utc>) {
        self.version = version;
        self.updated_at = at;
    }
}

/// What kind of entity an `entity_tags` row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Note,
    Todo,
}

/// The tags on one note or todo.
///
/// `version` follows the entity's own stream; unlinking a deleted tag does
/// not stamp the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTagsRow {
    pub entity_id: AggregateId,
    pub kind: EntityKind,
    pub tag_ids: BTreeSet<AggregateId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: Version,
}

impl ViewRow for EntityTagsRow {
    fn version(&self) -> Version {
        self.version
    }

    fn stamp(&mut self, version: Version, at: DateTime<Utc>) {
        self.version = version;
        self.updated_at = at;
    }
}

/// Projection maintaining `tags` and `entity_tags`.
#[derive(Clone)]
pub struct TagProjection {
    store: SharedProjectionStore,
}

impl TagProjection {
    pub const NAME: &'static str = "tags";

    const EVENT_TYPES: &'static [&'static str] = &[
        "TagCreated",
        "TagRenamed",
        "TagRecolored",
        "TagDeleted",
        "NoteCreated",
        "NoteTagged",
        "NoteUntagged",
        "NoteDeleted",
        "TodoCreated",
        "TodoTagged",
        "TodoUntagged",
        "TodoDeleted",
    ];

    pub fn new(store: SharedProjectionStore) -> Self {
        Self { store }
    }

    async fn update_tag<F>(&self, event: &RecordedEvent, update: F) -> Result<()>
    where
        F: FnOnce(&mut TagRow) + Send,
    {
        update_row(
            &self.store,
            Self::NAME,
            Table::Tags,
            event.stream_id,
            event,
            update,
        )
        .await
    }

    async fn entity_created(&self, event: &RecordedEvent, kind: EntityKind) -> Result<()> {
        let row = EntityTagsRow {
            entity_id: event.stream_id,
            kind,
            tag_ids: BTreeSet::new(),
            created_at: event.timestamp,
            updated_at: event.timestamp,
            version: event.version,
        };
        insert_row(&self.store, Table::EntityTags, event.stream_id, row).await
    }

    async fn link(&self, event: &RecordedEvent, tag_id: AggregateId, linked: bool) -> Result<()> {
        update_row(
            &self.store,
            Self::NAME,
            Table::EntityTags,
            event.stream_id,
            event,
            |row: &mut EntityTagsRow| {
                if linked {
                    row.tag_ids.insert(tag_id);
                } else {
                    row.tag_ids.remove(&tag_id);
                }
            },
        )
        .await
    }

    async fn entity_deleted(&self, event: &RecordedEvent) -> Result<()> {
        remove_row(
            &self.store,
            Self::NAME,
            Table::EntityTags,
            event.stream_id,
            event,
        )
        .await
    }

    async fn tag_deleted(&self, event: &RecordedEvent) -> Result<()> {
        let tag_id = event.stream_id;
        remove_row(&self.store, Self::NAME, Table::Tags, tag_id, event).await?;

        let rows: Vec<EntityTagsRow> = self.store.all_rows(Table::EntityTags).await?;
        for mut row in rows {
            if row.tag_ids.remove(&tag_id) {
                self.store
                    .put_row(Table::EntityTags, row.entity_id, &row)
                    .await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Projection for TagProjection {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn relevant_event_types(&self) -> &'static [&'static str] {
        Self::EVENT_TYPES
    }

    fn tables(&self) -> &'static [Table] {
        &[Table::Tags, Table::EntityTags]
    }

    fn store(&self) -> &SharedProjectionStore {
        &self.store
    }

    fn shadow(&self, store: SharedProjectionStore) -> Box<dyn Projection> {
        Box::new(Self::new(store))
    }

    async fn apply(&self, event: &RecordedEvent) -> Result<()> {
        match &event.event {
            NotebookEvent::Tag(tag) => match tag {
                TagEvent::TagCreated(data) => {
                    let row = TagRow {
                        tag_id: event.stream_id,
                        name: data.name.clone(),
                        color: data.color.clone(),
                        created_at: event.timestamp,
                        updated_at: event.timestamp,
                        version: event.version,
                    };
                    insert_row(&self.store, Table::Tags, event.stream_id, row).await
                }
                TagEvent::TagRenamed(data) => {
                    self.update_tag(event, |row| row.name = data.name.clone())
                        .await
                }
                TagEvent::TagRecolored(data) => {
                    self.update_tag(event, |row| row.color = data.color.clone())
                        .await
                }
                TagEvent::TagDeleted(_) => self.tag_deleted(event).await,
            },
            NotebookEvent::Note(note) => match note {
                NoteEvent::NoteCreated(_) => self.entity_created(event, EntityKind::Note).await,
                NoteEvent::NoteTagged(data) => self.link(event, data.tag_id, true).await,
                NoteEvent::NoteUntagged(data) => self.link(event, data.tag_id, false).await,
                NoteEvent::NoteDeleted(_) => self.entity_deleted(event).await,
                NoteEvent::NoteRenamed(_) | NoteEvent::NoteMoved(_) => Ok(()),
            },
            NotebookEvent::Todo(todo) => match todo {
                TodoEvent::TodoCreated(_) => self.entity_created(event, EntityKind::Todo).await,
                TodoEvent::TodoTagged(data) => self.link(event, data.tag_id, true).await,
                TodoEvent::TodoUntagged(data) => self.link(event, data.tag_id, false).await,
                TodoEvent::TodoDeleted(_) => self.entity_deleted(event).await,
                _ => Ok(()),
            },
            NotebookEvent::Category(_) => Ok(()),
        }
    }
}
