//! Category service providing a simplified API for category operations.

use common::AggregateId;
use event_store::EventStore;

use crate::command::{CommandHandler, CommandResult, RetryPolicy};
use crate::error::DomainError;
use crate::reference::References;
use crate::serializer::EventSerializer;

use super::{Category, CreateCategory, DeleteCategory, MoveCategory, RenameCategory};

/// Service for managing categories.
pub struct CategoryService<S: EventStore> {
    handler: CommandHandler<S, Category>,
    references: References<S>,
}

impl<S: EventStore + Clone> CategoryService<S> {
    /// Creates a new category service with the given event store.
    pub fn new(store: S, serializer: EventSerializer) -> Self {
        Self {
            handler: CommandHandler::new(store.clone(), serializer.clone()),
            references: References::new(store, serializer),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.handler = self.handler.with_retry_policy(retry);
        self
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Category> {
        &self.handler
    }

    /// Creates a category, optionally under an existing parent.
    #[tracing::instrument(skip(self))]
    pub async fn create_category(
        &self,
        cmd: CreateCategory,
    ) -> Result<CommandResult<Category>, DomainError> {
        if let Some(parent_id) = cmd.parent_id {
            self.references.require_category(parent_id).await?;
            self.references
                .ensure_can_nest(cmd.category_id, parent_id)
                .await?;
        }
        let changeset = Category::create_new(cmd.category_id, &cmd.name, cmd.parent_id)?;
        self.handler.create(changeset).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn rename_category(
        &self,
        cmd: RenameCategory,
    ) -> Result<CommandResult<Category>, DomainError> {
        self.handler
            .execute(cmd.category_id, |category| category.rename(&cmd.name))
            .await
    }

    /// Moves a category, refusing targets that are missing, deleted, or
    /// inside the category being moved.
    #[tracing::instrument(skip(self))]
    pub async fn move_category(
        &self,
        cmd: MoveCategory,
    ) -> Result<CommandResult<Category>, DomainError> {
        if let Some(parent_id) = cmd.parent_id {
            self.references.require_category(parent_id).await?;
            self.references
                .ensure_can_nest(cmd.category_id, parent_id)
                .await?;
        }
        self.handler
            .execute(cmd.category_id, |category| category.move_to(cmd.parent_id))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_category(
        &self,
        cmd: DeleteCategory,
    ) -> Result<CommandResult<Category>, DomainError> {
        self.handler
            .execute(cmd.category_id, |category| category.delete())
            .await
    }

    /// Loads a category by ID.
    ///
    /// Returns None if the category doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_category(
        &self,
        category_id: AggregateId,
    ) -> Result<Option<Category>, DomainError> {
        self.handler.load_existing(category_id).await
    }
}
