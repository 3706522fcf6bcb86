//! Note service providing a simplified API for note operations.

use common::AggregateId;
use event_store::EventStore;

use crate::command::{CommandHandler, CommandResult, RetryPolicy};
use crate::error::DomainError;
use crate::reference::References;
use crate::serializer::EventSerializer;

use super::{CreateNote, DeleteNote, MoveNote, Note, RenameNote, TagNote, UntagNote};

/// Service for managing notes.
///
/// Category and tag references are checked against their own streams before
/// the note command runs.
pub struct NoteService<S: EventStore> {
    handler: CommandHandler<S, Note>,
    references: References<S>,
}

impl<S: EventStore + Clone> NoteService<S> {
    /// Creates a new note service with the given event store.
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
    pub fn handler(&self) -> &CommandHandler<S, Note> {
        &self.handler
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_note(&self, cmd: CreateNote) -> Result<CommandResult<Note>, DomainError> {
        self.references
            .require_optional_category(cmd.category_id)
            .await?;
        let changeset = Note::create_new(cmd.note_id, &cmd.title, cmd.category_id)?;
        self.handler.create(changeset).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn rename_note(&self, cmd: RenameNote) -> Result<CommandResult<Note>, DomainError> {
        self.handler
            .execute(cmd.note_id, |note| note.rename(&cmd.title))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn move_note(&self, cmd: MoveNote) -> Result<CommandResult<Note>, DomainError> {
        self.references
            .require_optional_category(cmd.category_id)
            .await?;
        self.handler
            .execute(cmd.note_id, |note| note.move_to(cmd.category_id))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn tag_note(&self, cmd: TagNote) -> Result<CommandResult<Note>, DomainError> {
        self.references.require_tag(cmd.tag_id).await?;
        self.handler
            .execute(cmd.note_id, |note| note.add_tag(cmd.tag_id))
            .await
    }

    /// Detaching works for deleted tags too.
    #[tracing::instrument(skip(self))]
    pub async fn untag_note(&self, cmd: UntagNote) -> Result<CommandResult<Note>, DomainError> {
        self.handler
            .execute(cmd.note_id, |note| note.remove_tag(cmd.tag_id))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_note(&self, cmd: DeleteNote) -> Result<CommandResult<Note>, DomainError> {
        self.handler
            .execute(cmd.note_id, |note| note.delete())
            .await
    }

    /// Loads a note by ID.
    ///
    /// Returns None if the note doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_note(&self, note_id: AggregateId) -> Result<Option<Note>, DomainError> {
        self.handler.load_existing(note_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::NoteError;
    use crate::tag::{CreateTag, TagService};
    use event_store::{InMemoryEventStore, Version};

    #[tokio::test]
    async fn test_note_lifecycle() {
        let store = InMemoryEventStore::new();
        let serializer = EventSerializer::standard().unwrap();
        let notes = NoteService::new(store.clone(), serializer.clone());
        let tags = TagService::new(store, serializer);

        let create_tag = CreateTag::new("urgent", Some("#FF0000"));
        let tag_id = create_tag.tag_id;
        tags.create_tag(create_tag).await.unwrap();

        let cmd = CreateNote::new("todo.txt", None);
        let note_id = cmd.note_id;
        notes.create_note(cmd).await.unwrap();

        notes.tag_note(TagNote::new(note_id, tag_id)).await.unwrap();
        let result = notes
            .rename_note(RenameNote::new(note_id, "done.txt"))
            .await
            .unwrap();

        assert_eq!(result.new_version, Version::new(3));
        assert!(result.aggregate.has_tag(tag_id));
        assert_eq!(result.aggregate.title(), "done.txt");
    }

    #[tokio::test]
    async fn test_tagging_with_unknown_tag_is_rejected() {
        let notes = NoteService::new(InMemoryEventStore::new(), EventSerializer::standard().unwrap());
        let cmd = CreateNote::new("todo.txt", None);
        let note_id = cmd.note_id;
        notes.create_note(cmd).await.unwrap();

        let result = notes.tag_note(TagNote::new(note_id, AggregateId::new())).await;
        assert!(matches!(result, Err(DomainError::InvalidReference { .. })));
    }

    #[tokio::test]
    async fn test_create_in_missing_category_is_rejected() {
        let notes = NoteService::new(InMemoryEventStore::new(), EventSerializer::standard().unwrap());
        let result = notes
            .create_note(CreateNote::new("todo.txt", Some(AggregateId::new())))
            .await;
        assert!(matches!(result, Err(DomainError::InvalidReference { .. })));
    }

    #[tokio::test]
    async fn test_invalid_title_is_a_validation_error() {
        let notes = NoteService::new(InMemoryEventStore::new(), EventSerializer::standard().unwrap());
        let err = notes
            .create_note(CreateNote::new("a|b", None))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Note(NoteError::InvalidTitle(_))));
        assert!(err.is_validation());
    }
}
