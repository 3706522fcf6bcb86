//! Tag service providing a simplified API for tag operations.

use common::AggregateId;
use event_store::EventStore;

use crate::command::{CommandHandler, CommandResult, RetryPolicy};
use crate::error::DomainError;
use crate::serializer::EventSerializer;

use super::{CreateTag, DeleteTag, RecolorTag, RenameTag, Tag};

/// Service for managing tags.
pub struct TagService<S: EventStore> {
    handler: CommandHandler<S, Tag>,
}

impl<S: EventStore> TagService<S> {
    /// Creates a new tag service with the given event store.
    pub fn new(store: S, serializer: EventSerializer) -> Self {
        Self {
            handler: CommandHandler::new(store, serializer),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.handler = self.handler.with_retry_policy(retry);
        self
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Tag> {
        &self.handler
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_tag(&self, cmd: CreateTag) -> Result<CommandResult<Tag>, DomainError> {
        let changeset = Tag::create_new(cmd.tag_id, &cmd.name, cmd.color.as_deref())?;
        self.handler.create(changeset).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn rename_tag(&self, cmd: RenameTag) -> Result<CommandResult<Tag>, DomainError> {
        self.handler
            .execute(cmd.tag_id, |tag| tag.rename(&cmd.name))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn recolor_tag(&self, cmd: RecolorTag) -> Result<CommandResult<Tag>, DomainError> {
        self.handler
            .execute(cmd.tag_id, |tag| tag.recolor(cmd.color.as_deref()))
            .await
    }

    /// Deletes a tag. Notes and todos keep the id in their own streams; the
    /// tag projection drops the links.
    #[tracing::instrument(skip(self))]
    pub async fn delete_tag(&self, cmd: DeleteTag) -> Result<CommandResult<Tag>, DomainError> {
        self.handler.execute(cmd.tag_id, |tag| tag.delete()).await
    }

    /// Loads a tag by ID.
    ///
    /// Returns None if the tag doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_tag(&self, tag_id: AggregateId) -> Result<Option<Tag>, DomainError> {
        self.handler.load_existing(tag_id).await
    }
}
