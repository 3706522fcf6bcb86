//! Checks on references between aggregates.
//!
//! Each aggregate only sees its own stream, so whether a referenced category
//! or tag is usable is decided here, against the current state of the other
//! stream, right before the command runs.

use common::AggregateId;
use event_store::EventStore;

use crate::aggregate::Aggregate;
use crate::category::{Category, CategoryError};
use crate::command::CommandHandler;
use crate::error::DomainError;
use crate::serializer::EventSerializer;
use crate::tag::Tag;

/// Deepest level a category may sit at. Root categories are level 1.
pub const MAX_CATEGORY_DEPTH: usize = 64;

pub(crate) struct References<S: EventStore> {
    categories: CommandHandler<S, Category>,
    tags: CommandHandler<S, Tag>,
}

impl<S: EventStore + Clone> References<S> {
    pub(crate) fn new(store: S, serializer: EventSerializer) -> Self {
        Self {
            categories: CommandHandler::new(store.clone(), serializer.clone()),
            tags: CommandHandler::new(store, serializer),
        }
    }
}

impl<S: EventStore> References<S> {
    /// The category must exist and not be deleted.
    pub(crate) async fn require_category(&self, id: AggregateId) -> Result<Category, DomainError> {
        match self.categories.load_existing(id).await? {
            None => Err(invalid::<Category>(id, "does not exist")),
            Some(category) if category.is_deleted() => {
                Err(invalid::<Category>(id, "has been deleted"))
            }
            Some(category) => Ok(category),
        }
    }

    pub(crate) async fn require_optional_category(
        &self,
        id: Option<AggregateId>,
    ) -> Result<(), DomainError> {
        if let Some(id) = id {
            self.require_category(id).await?;
        }
        Ok(())
    }

    /// The tag must exist and not be deleted.
    pub(crate) async fn require_tag(&self, id: AggregateId) -> Result<Tag, DomainError> {
        match self.tags.load_existing(id).await? {
            None => Err(invalid::<Tag>(id, "does not exist")),
            Some(tag) if tag.is_deleted() => Err(invalid::<Tag>(id, "has been deleted")),
            Some(tag) => Ok(tag),
        }
    }

    /// Walks up from `new_parent` to the root. Fails if `category_id` is on
    /// the way, or if a child of `new_parent` would sit deeper than
    /// [`MAX_CATEGORY_DEPTH`].
    ///
    /// Creates and moves share this rule.
    pub(crate) async fn ensure_can_nest(
        &self,
        category_id: AggregateId,
        new_parent: AggregateId,
    ) -> Result<(), DomainError> {
        let mut current = Some(new_parent);
        // Level the category would land on, counted as ancestors are visited.
        let mut depth = 1;

        while let Some(id) = current {
            if id == category_id {
                return Err(CategoryError::Cycle {
                    category_id,
                    parent_id: new_parent,
                }
                .into());
            }
            depth += 1;
            if depth > MAX_CATEGORY_DEPTH {
                return Err(CategoryError::TooDeep {
                    max: MAX_CATEGORY_DEPTH,
                }
                .into());
            }
            current = self.categories.load(id).await?.parent_id();
        }

        Ok(())
    }
}

fn invalid<A: Aggregate>(aggregate_id: AggregateId, reason: &'static str) -> DomainError {
    DomainError::InvalidReference {
        aggregate_type: A::aggregate_type(),
        aggregate_id,
        reason,
    }
}
