use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::AggregateId;

use super::{QueryService, SnapshotCache};
use crate::Result;
use crate::store::{ProjectionStoreExt, SharedProjectionStore, Table};
use crate::views::{EntityTagsRow, TagRow};

/// Filter for [`TagQueries::search`].
#[derive(Debug, Clone, Default)]
pub struct TagSearch {
    /// Case-insensitive fragment of the tag name.
    pub name_contains: Option<String>,
}

/// Queries over tags and the notes and todos carrying them.
///
/// Children of a tag are the entities tagged with it; the children of `None`
/// are the entities with no tags at all.
pub struct TagQueries {
    store: SharedProjectionStore,
    tags: SnapshotCache<TagRow>,
    entities: SnapshotCache<EntityTagsRow>,
}

impl TagQueries {
    pub fn new(store: SharedProjectionStore, ttl: Duration) -> Self {
        Self {
            store,
            tags: SnapshotCache::new("tags", ttl),
            entities: SnapshotCache::new("entity_tags", ttl),
        }
    }

    async fn all_tags(&self) -> Result<Arc<Vec<TagRow>>> {
        let store = &self.store;
        self.tags
            .get_or_load(move || async move {
                let mut tags: Vec<TagRow> = store.all_rows(Table::Tags).await?;
                tags.sort_by_key(|t| (t.name.to_lowercase(), t.tag_id));
                Ok(tags)
            })
            .await
    }

    async fn all_entities(&self) -> Result<Arc<Vec<EntityTagsRow>>> {
        let store = &self.store;
        self.entities
            .get_or_load(move || async move { store.all_rows(Table::EntityTags).await })
            .await
    }

    /// The tags on one note or todo, by name.
    pub async fn tags_for(&self, entity_id: AggregateId) -> Result<Vec<TagRow>> {
        let entities = self.all_entities().await?;
        let Some(entity) = entities.iter().find(|e| e.entity_id == entity_id) else {
            return Ok(Vec::new());
        };
        Ok(self
            .all_tags()
            .await?
            .iter()
            .filter(|t| entity.tag_ids.contains(&t.tag_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl QueryService for TagQueries {
    type Item = TagRow;
    type Child = EntityTagsRow;
    type Filter = TagSearch;

    async fn get_all(&self) -> Result<Vec<TagRow>> {
        Ok(self.all_tags().await?.to_vec())
    }

    async fn get_by_id(&self, id: AggregateId) -> Result<Option<TagRow>> {
        Ok(self.all_tags().await?.iter().find(|t| t.tag_id == id).cloned())
    }

    async fn get_children_of(&self, parent: Option<AggregateId>) -> Result<Vec<EntityTagsRow>> {
        Ok(self
            .all_entities()
            .await?
            .iter()
            .filter(|e| match parent {
                Some(tag_id) => e.tag_ids.contains(&tag_id),
                None => e.tag_ids.is_empty(),
            })
            .cloned()
            .collect())
    }

    async fn search(&self, filter: &TagSearch) -> Result<Vec<TagRow>> {
        let needle = filter.name_contains.as_deref().map(str::to_lowercase);
        Ok(self
            .all_tags()
            .await?
            .iter()
            .filter(|t| {
                needle
                    .as_deref()
                    .is_none_or(|needle| t.name.to_lowercase().contains(needle))
            })
            .cloned()
            .collect())
    }

    async fn invalidate(&self) {
        self.tags.invalidate().await;
        self.entities.invalidate().await;
    }
}
