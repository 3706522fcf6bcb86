//! Tag commands.

use common::AggregateId;

use crate::command::Command;

use super::Tag;

/// Command to create a new tag.
#[derive(Debug, Clone)]
pub struct CreateTag {
    /// The tag ID to create.
    pub tag_id: AggregateId,

    pub name: String,

    /// Optional `#RRGGBB` colour.
    pub color: Option<String>,
}

impl CreateTag {
    /// Creates a new CreateTag command with a generated tag ID.
    pub fn new(name: impl Into<String>, color: Option<&str>) -> Self {
        Self {
            tag_id: AggregateId::new(),
            name: name.into(),
            color: color.map(str::to_string),
        }
    }
}

impl Command for CreateTag {
    type Aggregate = Tag;

    fn aggregate_id(&self) -> AggregateId {
        self.tag_id
    }
}

/// Command to rename a tag.
#[derive(Debug, Clone)]
pub struct RenameTag {
    pub tag_id: AggregateId,
    pub name: String,
}

impl RenameTag {
    pub fn new(tag_id: AggregateId, name: impl Into<String>) -> Self {
        Self {
            tag_id,
            name: name.into(),
        }
    }
}

impl Command for RenameTag {
    type Aggregate = Tag;

    fn aggregate_id(&self) -> AggregateId {
        self.tag_id
    }
}

/// Command to set or clear a tag's colour.
#[derive(Debug, Clone)]
pub struct RecolorTag {
    pub tag_id: AggregateId,
    pub color: Option<String>,
}

impl RecolorTag {
    pub fn new(tag_id: AggregateId, color: Option<&str>) -> Self {
        Self {
            tag_id,
            color: color.map(str::to_string),
        }
    }
}

impl Command for RecolorTag {
    type Aggregate = Tag;

    fn aggregate_id(&self) -> AggregateId {
        self.tag_id
    }
}

/// Command to delete a tag.
#[derive(Debug, Clone)]
pub struct DeleteTag {
    pub tag_id: AggregateId,
}

impl DeleteTag {
    pub fn new(tag_id: AggregateId) -> Self {
        Self { tag_id }
    }
}

impl Command for DeleteTag {
    type Aggregate = Tag;

    fn aggregate_id(&self) -> AggregateId {
        self.tag_id
    }
}
