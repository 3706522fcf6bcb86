use std::cmp::Reverse;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::AggregateId;
use domain::Priority;

use super::{QueryService, SnapshotCache};
use crate::Result;
use crate::store::{ProjectionStoreExt, SharedProjectionStore, Table};
use crate::views::TodoRow;

/// Filter for [`TodoQueries::search`]. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct TodoSearch {
    /// Case-insensitive fragment of the todo text.
    pub text_contains: Option<String>,
    pub completed: Option<bool>,
    pub min_priority: Option<Priority>,
    pub tag_id: Option<AggregateId>,
    /// Only todos due strictly before this date.
    pub due_before: Option<NaiveDate>,
}

impl TodoSearch {
    fn matches(&self, todo: &TodoRow, needle: Option<&str>) -> bool {
        needle.is_none_or(|needle| todo.text.to_lowercase().contains(needle))
            && self.completed.is_none_or(|c| todo.completed == c)
            && self.min_priority.is_none_or(|p| todo.priority >= p)
            && self.tag_id.is_none_or(|t| todo.tag_ids.contains(&t))
            && self
                .due_before
                .is_none_or(|before| todo.due_date.is_some_and(|due| due < before))
    }
}

/// Queries over todos.
///
/// Open todos come first, most urgent first, then oldest first. Children of a
/// category are the todos filed under it; children of `None` are the
/// uncategorised ones.
pub struct TodoQueries {
    store: SharedProjectionStore,
    cache: SnapshotCache<TodoRow>,
}

impl TodoQueries {
    pub fn new(store: SharedProjectionStore, ttl: Duration) -> Self {
        Self {
            store,
            cache: SnapshotCache::new("todos", ttl),
        }
    }

    async fn all(&self) -> Result<Arc<Vec<TodoRow>>> {
        let store = &self.store;
        self.cache
            .get_or_load(move || async move {
                let mut todos: Vec<TodoRow> = store.all_rows(Table::Todos).await?;
                todos.sort_by_key(|t| (t.completed, Reverse(t.priority), t.created_at, t.todo_id));
                Ok(todos)
            })
            .await
    }
}

#[async_trait]
impl QueryService for TodoQueries {
    type Item = TodoRow;
    type Child = TodoRow;
    type Filter = TodoSearch;

    async fn get_all(&self) -> Result<Vec<TodoRow>> {
        Ok(self.all().await?.to_vec())
    }

    async fn get_by_id(&self, id: AggregateId) -> Result<Option<TodoRow>> {
        Ok(self.all().await?.iter().find(|t| t.todo_id == id).cloned())
    }

    async fn get_children_of(&self, parent: Option<AggregateId>) -> Result<Vec<TodoRow>> {
        Ok(self
            .all()
            .await?
            .iter()
            .filter(|t| t.category_id == parent)
            .cloned()
            .collect())
    }

    async fn search(&self, filter: &TodoSearch) -> Result<Vec<TodoRow>> {
        let needle = filter.text_contains.as_deref().map(str::to_lowercase);
        Ok(self
            .all()
            .await?
            .iter()
            .filter(|t| filter.matches(t, needle.as_deref()))
            .cloned()
            .collect())
    }

    async fn invalidate(&self) {
        self.cache.invalidate().await;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use chrono::Utc;
    use event_store::Version;

    fn todo(text: &str, priority: Priority, due: Option<NaiveDate>) -> TodoRow {
        let now = Utc::now();
        TodoRow {
            todo_id: AggregateId::new(),
            text: text.to_string(),
            category_id: None,
            priority,
            due_date: due,
            completed: false,
            completed_at: None,
            tag_ids: BTreeSet::new(),
            created_at: now,
            updated_at: now,
            version: Version::first(),
        }
    }

    #[test]
    fn search_filters_combine() {
        let early = NaiveDate::from_ymd_opt(2024, 1, 10);
        let late = NaiveDate::from_ymd_opt(2024, 6, 1);
        let cutoff = NaiveDate::from_ymd_opt(2024, 3, 1);
        let milk = todo("Buy milk", Priority::Urgent, early);
        let bread = todo("Buy bread", Priority::Low, early);
        let tax = todo("File taxes", Priority::High, late);

        let filter = TodoSearch {
            text_contains: Some("BUY".into()),
            min_priority: Some(Priority::Normal),
            due_before: cutoff,
            ..Default::default()
        };
        let needle = Some("buy");

        assert!(filter.matches(&milk, needle));
        assert!(!filter.matches(&bread, needle));
        assert!(!filter.matches(&tax, needle));
    }

    #[test]
    fn undated_todos_never_match_due_before() {
        let filter = TodoSearch {
            due_before: NaiveDate::from_ymd_opt(2030, 1, 1),
            ..Default::default()
        };
        assert!(!filter.matches(&todo("Someday", Priority::Normal, None), None));
    }
}
