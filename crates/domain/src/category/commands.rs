//! Category commands.

use common::AggregateId;

use crate::command::Command;

use super::Category;

/// Command to create a new category.
#[derive(Debug, Clone)]
pub struct CreateCategory {
    /// The category ID to create.
    pub category_id: AggregateId,

    pub name: String,

    /// Parent category; None creates a root category.
    pub parent_id: Option<AggregateId>,
}

impl CreateCategory {
    /// Creates a new CreateCategory command with a generated category ID.
    pub fn new(name: impl Into<String>, parent_id: Option<AggregateId>) -> Self {
        Self {
            category_id: AggregateId::new(),
            name: name.into(),
            parent_id,
        }
    }
}

impl Command for CreateCategory {
    type Aggregate = Category;

    fn aggregate_id(&self) -> AggregateId {
        self.category_id
    }
}

/// Command to rename a category.
#[derive(Debug, Clone)]
pub struct RenameCategory {
    pub category_id: AggregateId,
    pub name: String,
}

impl RenameCategory {
    pub fn new(category_id: AggregateId, name: impl Into<String>) -> Self {
        Self {
            category_id,
            name: name.into(),
        }
    }
}

impl Command for RenameCategory {
    type Aggregate = Category;

    fn aggregate_id(&self) -> AggregateId {
        self.category_id
    }
}

/// Command to move a category under another parent, or to the root.
#[derive(Debug, Clone)]
pub struct MoveCategory {
    pub category_id: AggregateId,
    pub parent_id: Option<AggregateId>,
}

impl MoveCategory {
    pub fn new(category_id: AggregateId, parent_id: Option<AggregateId>) -> Self {
        Self {
            category_id,
            parent_id,
        }
    }
}

impl Command for MoveCategory {
    type Aggregate = Category;

    fn aggregate_id(&self) -> AggregateId {
        self.category_id
    }
}

/// Command to delete a category.
#[derive(Debug, Clone)]
pub struct DeleteCategory {
    pub category_id: AggregateId,
}

impl DeleteCategory {
    pub fn new(category_id: AggregateId) -> Self {
        Self { category_id }
    }
}

impl Command for DeleteCategory {
    type Aggregate = Category;

    fn aggregate_id(&self) -> AggregateId {
        self.category_id
    }
}
