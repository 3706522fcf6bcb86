//! Category aggregate implementation.

use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, Changeset};
use crate::validation::CATEGORY_NAME;

use super::{CategoryError, CategoryEvent};

/// Category aggregate root.
///
/// A named folder that holds notes, todos and other categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    id: Option<AggregateId>,
    #[serde(default)]
    version: Version,
    name: String,
    parent_id: Option<AggregateId>,
    deleted: bool,
}

impl Aggregate for Category {
    type Event = CategoryEvent;
    type Error = CategoryError;

    fn aggregate_type() -> &'static str {
        "Category"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(mut self, event: &Self::Event) -> Self {
        match event {
            CategoryEvent::CategoryCreated(data) => {
                self.id = Some(data.category_id);
                self.name = data.name.clone();
                self.parent_id = data.parent_id;
            }
            CategoryEvent::CategoryRenamed(data) => self.name = data.name.clone(),
            CategoryEvent::CategoryMoved(data) => self.parent_id = data.parent_id,
            CategoryEvent::CategoryDeleted(_) => self.deleted = true,
        }
        self
    }
}

// Query methods
impl Category {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// None for a root category.
    pub fn parent_id(&self) -> Option<AggregateId> {
        self.parent_id
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}

// Command methods (return events)
impl Category {
    /// Validates the inputs and starts a new category stream.
    ///
    /// Whether `parent_id` refers to a live category is checked by the
    /// service, which can see other streams.
    pub fn create_new(
        id: AggregateId,
        name: &str,
        parent_id: Option<AggregateId>,
    ) -> Result<Changeset<Self>, CategoryError> {
        let name = CATEGORY_NAME.check(name)?;
        if parent_id == Some(id) {
            return Err(CategoryError::SelfParent);
        }
        Ok(Changeset::created(CategoryEvent::category_created(
            id, name, parent_id,
        )))
    }

    pub fn rename(&self, name: &str) -> Result<CategoryEvent, CategoryError> {
        self.ensure_live()?;
        let name = CATEGORY_NAME.check(name)?;
        if name == self.name {
            return Err(CategoryError::Unchanged { field: "name" });
        }
        Ok(CategoryEvent::category_renamed(name))
    }

    /// Moves the category under `parent_id`, or to the root for None.
    pub fn move_to(&self, parent_id: Option<AggregateId>) -> Result<CategoryEvent, CategoryError> {
        self.ensure_live()?;
        if parent_id.is_some() && parent_id == self.id {
            return Err(CategoryError::SelfParent);
        }
        if parent_id == self.parent_id {
            return Err(CategoryError::Unchanged { field: "parent" });
        }
        Ok(CategoryEvent::category_moved(parent_id))
    }

    pub fn delete(&self) -> Result<CategoryEvent, CategoryError> {
        self.ensure_live()?;
        Ok(CategoryEvent::category_deleted())
    }

    fn ensure_live(&self) -> Result<(), CategoryError> {
        if self.id.is_none() {
            return Err(CategoryError::NotCreated);
        }
        if self.deleted {
            return Err(CategoryError::Deleted);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DomainEvent;
    use crate::validation::TextError;

    fn projects() -> Category {
        let changeset = Category::create_new(AggregateId::new(), "Projects", None).unwrap();
        changeset.aggregate().clone()
    }

    #[test]
    fn test_create_category() {
        let id = AggregateId::new();
        let parent = AggregateId::new();
        let changeset = Category::create_new(id, "  Projects ", Some(parent)).unwrap();

        let category = changeset.aggregate();
        assert_eq!(category.id(), Some(id));
        assert_eq!(category.name(), "Projects");
        assert_eq!(category.parent_id(), Some(parent));
        assert_eq!(changeset.uncommitted()[0].event_type(), "CategoryCreated");
    }

    #[test]
    fn test_create_rejects_bad_names() {
        let id = AggregateId::new();
        assert!(matches!(
            Category::create_new(id, "", None),
            Err(CategoryError::InvalidName(TextError::Empty { .. }))
        ));
        assert!(matches!(
            Category::create_new(id, "a/b", None),
            Err(CategoryError::InvalidName(TextError::ForbiddenCharacter { .. }))
        ));
        assert!(Category::create_new(id, &"x".repeat(101), None).is_err());
        assert!(Category::create_new(id, &"x".repeat(100), None).is_ok());
    }

    #[test]
    fn test_create_rejects_self_parent() {
        let id = AggregateId::new();
        assert_eq!(
            Category::create_new(id, "Loop", Some(id)).unwrap_err(),
            CategoryError::SelfParent
        );
    }

    #[test]
    fn test_rename() {
        let category = projects();
        let event = category.rename("Work").unwrap();
        let category = category.apply(&event);
        assert_eq!(category.name(), "Work");

        assert_eq!(
            category.rename("Work"),
            Err(CategoryError::Unchanged { field: "name" })
        );
    }

    #[test]
    fn test_move() {
        let category = projects();
        let parent = AggregateId::new();

        let event = category.move_to(Some(parent)).unwrap();
        let category = category.apply(&event);
        assert_eq!(category.parent_id(), Some(parent));

        assert_eq!(
            category.move_to(category.id()),
            Err(CategoryError::SelfParent)
        );
        assert_eq!(
            category.move_to(Some(parent)),
            Err(CategoryError::Unchanged { field: "parent" })
        );
        assert!(category.move_to(None).is_ok());
    }

    #[test]
    fn test_deleted_category_rejects_everything() {
        let category = projects();
        let category = category.clone().apply(&category.delete().unwrap());

        assert!(category.is_deleted());
        assert_eq!(category.rename("Other"), Err(CategoryError::Deleted));
        assert_eq!(category.move_to(None), Err(CategoryError::Deleted));
        assert_eq!(category.delete(), Err(CategoryError::Deleted));
    }

    #[test]
    fn test_commands_on_uncreated_category() {
        let category = Category::default();
        assert_eq!(category.rename("Work"), Err(CategoryError::NotCreated));
    }
}
