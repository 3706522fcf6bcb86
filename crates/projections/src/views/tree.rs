//! Tree view: categories and notes as one navigable hierarchy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{CategoryEvent, NotebookEvent, NoteEvent, RecordedEvent};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::projection::{Projection, ViewRow, insert_row, update_row};
use crate::store::{SharedProjectionStore, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Category,
    Note,
}

/// One node of the notebook tree.
///
/// Deleted nodes stay as tombstones; queries hide them together with
/// everything below them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: AggregateId,
    pub kind: NodeKind,
    pub name: String,
    pub parent_id: Option<AggregateId>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: Version,
}

impl ViewRow for TreeNode {
    fn version(&self) -> Version {
        self.version
    }

    fn stamp(&mut self, version: Version, at: DateTime<Utc>) {
        self.version = version;
        self.updated_at = at;
    }
}

/// Projection maintaining `tree_nodes`.
#[derive(Clone)]
pub struct TreeViewProjection {
    store: SharedProjectionStore,
}

impl TreeViewProjection {
    pub const NAME: &'static str = "tree_view";

    const EVENT_TYPES: &'static [&'static str] = &[
        "CategoryCreated",
        "CategoryRenamed",
        "CategoryMoved",
        "CategoryDeleted",
        "NoteCreated",
        "NoteRenamed",
        "NoteMoved",
        "NoteDeleted",
    ];

    pub fn new(store: SharedProjectionStore) -> Self {
        Self { store }
    }

    fn node(
        event: &RecordedEvent,
        kind: NodeKind,
        name: &str,
        parent_id: Option<AggregateId>,
    ) -> TreeNode {
        TreeNode {
            id: event.stream_id,
            kind,
            name: name.to_string(),
            parent_id,
            deleted: false,
            created_at: event.timestamp,
            updated_at: event.timestamp,
            version: event.version,
        }
    }

    async fn update<F>(&self, event: &RecordedEvent, update: F) -> Result<()>
    where
        F: FnOnce(&mut TreeNode) + Send,
    {
        update_row(
            &self.store,
            Self::NAME,
            Table::TreeNodes,
            event.stream_id,
            event,
            update,
        )
        .await
    }
}

#[async_trait]
impl Projection for TreeViewProjection {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn relevant_event_types(&self) -> &'static [&'static str] {
        Self::EVENT_TYPES
    }

    fn tables(&self) -> &'static [Table] {
        &[Table::TreeNodes]
    }

    fn store(&self) -> &SharedProjectionStore {
        &self.store
    }

    fn shadow(&self, store: SharedProjectionStore) -> Box<dyn Projection> {
        Box::new(Self::new(store))
    }

    async fn apply(&self, event: &RecordedEvent) -> Result<()> {
        match &event.event {
            NotebookEvent::Category(category) => match category {
                CategoryEvent::CategoryCreated(data) => {
                    let node = Self::node(event, NodeKind::Category, &data.name, data.parent_id);
                    insert_row(&self.store, Table::TreeNodes, event.stream_id, node).await
                }
                CategoryEvent::CategoryRenamed(data) => {
                    self.update(event, |node| node.name = data.name.clone())
                        .await
                }
                CategoryEvent::CategoryMoved(data) => {
                    self.update(event, |node| node.parent_id = data.parent_id)
                        .await
                }
                CategoryEvent::CategoryDeleted(_) => {
                    self.update(event, |node| node.deleted = true).await
                }
            },
            NotebookEvent::Note(note) => match note {
                NoteEvent::NoteCreated(data) => {
                    let node = Self::node(event, NodeKind::Note, &data.title, data.category_id);
                    insert_row(&self.store, Table::TreeNodes, event.stream_id, node).await
                }
                NoteEvent::NoteRenamed(data) => {
                    self.update(event, |node| node.name = data.title.clone())
                        .await
                }
                NoteEvent::NoteMoved(data) => {
                    self.update(event, |node| node.parent_id = data.category_id)
                        .await
                }
                NoteEvent::NoteDeleted(_) => self.update(event, |node| node.deleted = true).await,
                NoteEvent::NoteTagged(_) | NoteEvent::NoteUntagged(_) => Ok(()),
            },
            NotebookEvent::Tag(_) | NotebookEvent::Todo(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::{InMemoryProjectionStore, ProjectionStoreExt};
    use chrono::TimeZone;
    use event_store::Position;

    fn recorded(stream_id: AggregateId, version: i64, event: NotebookEvent) -> RecordedEvent {
        RecordedEvent {
            position: Position::new(version as u64),
            stream_id,
            version: Version::new(version),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, version as u32).unwrap(),
            event,
        }
    }

    fn projection() -> TreeViewProjection {
        TreeViewProjection::new(Arc::new(InMemoryProjectionStore::new()))
    }

    async fn node(projection: &TreeViewProjection, id: AggregateId) -> Option<TreeNode> {
        projection
            .store()
            .get_row(Table::TreeNodes, id)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn category_lifecycle_tombstones_on_delete() {
        let projection = projection();
        let id = AggregateId::new();

        projection
            .apply(&recorded(
                id,
                1,
                CategoryEvent::category_created(id, "Projects".into(), None).into(),
            ))
            .await
            .unwrap();
        projection
            .apply(&recorded(
                id,
                2,
                CategoryEvent::category_renamed("Work".into()).into(),
            ))
            .await
            .unwrap();

        let renamed = node(&projection, id).await.unwrap();
        assert_eq!(renamed.name, "Work");
        assert_eq!(renamed.kind, NodeKind::Category);
        assert_eq!(renamed.version, Version::new(2));
        assert!(renamed.updated_at > renamed.created_at);

        projection
            .apply(&recorded(id, 3, CategoryEvent::category_deleted().into()))
            .await
            .unwrap();
        assert!(node(&projection, id).await.unwrap().deleted);
    }

    #[tokio::test]
    async fn reapplying_an_event_changes_nothing() {
        let projection = projection();
        let id = AggregateId::new();
        let created = recorded(
            id,
            1,
            NoteEvent::note_created(id, "todo.txt".into(), None).into(),
        );
        let renamed = recorded(id, 2, NoteEvent::note_renamed("done.txt".into()).into());

        for event in [&created, &renamed] {
            projection.apply(event).await.unwrap();
        }
        let once = projection.snapshot_rows().await.unwrap();

        for event in [&created, &renamed] {
            projection.apply(event).await.unwrap();
        }
        assert_eq!(projection.snapshot_rows().await.unwrap(), once);
    }

    #[tokio::test]
    async fn update_for_missing_row_is_skipped() {
        let projection = projection();
        let id = AggregateId::new();

        projection
            .apply(&recorded(
                id,
                2,
                NoteEvent::note_renamed("ghost.md".into()).into(),
            ))
            .await
            .unwrap();

        assert!(node(&projection, id).await.is_none());
        assert_eq!(projection.row_count().await.unwrap(), 0);
    }
}
