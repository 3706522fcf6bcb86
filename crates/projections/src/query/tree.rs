use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::AggregateId;

use super::{QueryService, SnapshotCache};
use crate::Result;
use crate::store::{ProjectionStoreExt, SharedProjectionStore, Table};
use crate::views::{NodeKind, TreeNode};

/// Filter for [`TreeQueries::search`].
#[derive(Debug, Clone, Default)]
pub struct TreeSearch {
    /// Case-insensitive fragment of the node name.
    pub name_contains: Option<String>,
    pub kind: Option<NodeKind>,
}

/// Queries over the notebook tree.
///
/// Only visible nodes are returned: a node is hidden when it or any of its
/// ancestors is tombstoned, or when its chain of parents is broken.
pub struct TreeQueries {
    store: SharedProjectionStore,
    cache: SnapshotCache<TreeNode>,
}

impl TreeQueries {
    pub fn new(store: SharedProjectionStore, ttl: Duration) -> Self {
        Self {
            store,
            cache: SnapshotCache::new("tree", ttl),
        }
    }

    async fn visible(&self) -> Result<Arc<Vec<TreeNode>>> {
        self.cache
            .get_or_load(move || async move {
                let nodes: Vec<TreeNode> = self.store.all_rows(Table::TreeNodes).await?;
                Ok(visible_nodes(nodes))
            })
            .await
    }
}

fn visible_nodes(nodes: Vec<TreeNode>) -> Vec<TreeNode> {
    let by_id: HashMap<AggregateId, &TreeNode> = nodes.iter().map(|n| (n.id, n)).collect();
    let is_visible = |node: &TreeNode| {
        let mut seen = HashSet::new();
        let mut current = node;
        loop {
            // A node seen twice means the parent links form a cycle.
            if current.deleted || !seen.insert(current.id) {
                return false;
            }
            match current.parent_id {
                None => return true,
                Some(parent) => match by_id.get(&parent) {
                    Some(parent) => current = parent,
                    None => return false,
                },
            }
        }
    };

    let mut visible: Vec<TreeNode> = nodes.iter().filter(|n| is_visible(n)).cloned().collect();
    visible.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
    visible
}

/// Categories before notes, then by name.
fn sort_key(node: &TreeNode) -> (bool, String, AggregateId) {
    (
        node.kind == NodeKind::Note,
        node.name.to_lowercase(),
        node.id,
    )
}

#[async_trait]
impl QueryService for TreeQueries {
    type Item = TreeNode;
    type Child = TreeNode;
    type Filter = TreeSearch;

    async fn get_all(&self) -> Result<Vec<TreeNode>> {
        Ok(self.visible().await?.to_vec())
    }

    async fn get_by_id(&self, id: AggregateId) -> Result<Option<TreeNode>> {
        Ok(self.visible().await?.iter().find(|n| n.id == id).cloned())
    }

    async fn get_children_of(&self, parent: Option<AggregateId>) -> Result<Vec<TreeNode>> {
        Ok(self
            .visible()
            .await?
            .iter()
            .filter(|n| n.parent_id == parent)
            .cloned()
            .collect())
    }

    async fn search(&self, filter: &TreeSearch) -> Result<Vec<TreeNode>> {
        let needle = filter.name_contains.as_deref().map(str::to_lowercase);
        Ok(self
            .visible()
            .await?
            .iter()
            .filter(|n| filter.kind.is_none_or(|kind| n.kind == kind))
            .filter(|n| {
                needle
                    .as_deref()
                    .is_none_or(|needle| n.name.to_lowercase().contains(needle))
            })
            .cloned()
            .collect())
    }

    async fn invalidate(&self) {
        self.cache.invalidate().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use event_store::Version;

    fn node(kind: NodeKind, name: &str, parent_id: Option<AggregateId>) -> TreeNode {
        let now = Utc::now();
        TreeNode {
            id: AggregateId::new(),
            kind,
            name: name.to_string(),
            parent_id,
            deleted: false,
            created_at: now,
            updated_at: now,
            version: Version::first(),
        }
    }

    #[test]
    fn tombstones_hide_their_subtree() {
        let mut archive = node(NodeKind::Category, "Archive", None);
        archive.deleted = true;
        let old = node(NodeKind::Note, "old.md", Some(archive.id));
        let work = node(NodeKind::Category, "Work", None);
        let plan = node(NodeKind::Note, "plan.md", Some(work.id));
        let orphan = node(NodeKind::Note, "orphan.md", Some(AggregateId::new()));

        let visible = visible_nodes(vec![archive, old, work.clone(), plan.clone(), orphan]);
        let names: Vec<&str> = visible.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Work", "plan.md"]);
    }

    #[test]
    fn cyclic_parents_are_hidden() {
        let mut a = node(NodeKind::Category, "A", None);
        let b = node(NodeKind::Category, "B", Some(a.id));
        a.parent_id = Some(b.id);

        assert!(visible_nodes(vec![a, b]).is_empty());
    }

    #[test]
    fn deep_chains_stay_visible() {
        let mut nodes = vec![node(NodeKind::Category, "level-1", None)];
        for level in 2..=100 {
            let parent = nodes.last().map(|n| n.id);
            nodes.push(node(NodeKind::Category, &format!("level-{level}"), parent));
        }
        let leaf = node(NodeKind::Note, "leaf.md", nodes.last().map(|n| n.id));
        nodes.push(leaf.clone());

        let visible = visible_nodes(nodes);
        assert_eq!(visible.len(), 101);
        assert!(visible.iter().any(|n| n.id == leaf.id));
    }
}
