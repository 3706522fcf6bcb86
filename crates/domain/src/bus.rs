//! Single entry point for every notebook command.

use async_trait::async_trait;
use common::AggregateId;
use event_store::{EventStore, Position, Version};

use crate::aggregate::{Aggregate, DomainEvent};
use crate::category::{
    CategoryService, CreateCategory, DeleteCategory, MoveCategory, RenameCategory,
};
use crate::command::{Command, CommandResult, RetryPolicy};
use crate::error::DomainError;
use crate::event::NotebookEvent;
use crate::note::{CreateNote, DeleteNote, MoveNote, NoteService, RenameNote, TagNote, UntagNote};
use crate::serializer::EventSerializer;
use crate::tag::{CreateTag, DeleteTag, RecolorTag, RenameTag, TagService};
use crate::todo::{
    ChangeTodoText, CompleteTodo, CreateTodo, DeleteTodo, MoveTodo, ReopenTodo, SetTodoDueDate,
    SetTodoPriority, TagTodo, TodoService, UntagTodo,
};

/// Any command the notebook accepts.
#[derive(Debug, Clone)]
pub enum NotebookCommand {
    CreateCategory(CreateCategory),
    RenameCategory(RenameCategory),
    MoveCategory(MoveCategory),
    DeleteCategory(DeleteCategory),

    CreateNote(CreateNote),
    RenameNote(RenameNote),
    MoveNote(MoveNote),
    TagNote(TagNote),
    UntagNote(UntagNote),
    DeleteNote(DeleteNote),

    CreateTag(CreateTag),
    RenameTag(RenameTag),
    RecolorTag(RecolorTag),
    DeleteTag(DeleteTag),

    CreateTodo(CreateTodo),
    ChangeTodoText(ChangeTodoText),
    CompleteTodo(CompleteTodo),
    ReopenTodo(ReopenTodo),
    SetTodoPriority(SetTodoPriority),
    SetTodoDueDate(SetTodoDueDate),
    MoveTodo(MoveTodo),
    TagTodo(TagTodo),
    UntagTodo(UntagTodo),
    DeleteTodo(DeleteTodo),
}

impl NotebookCommand {
    /// The stream the command writes to.
    pub fn aggregate_id(&self) -> AggregateId {
        match self {
            NotebookCommand::CreateCategory(c) => c.aggregate_id(),
            NotebookCommand::RenameCategory(c) => c.aggregate_id(),
            NotebookCommand::MoveCategory(c) => c.aggregate_id(),
            NotebookCommand::DeleteCategory(c) => c.aggregate_id(),
            NotebookCommand::CreateNote(c) => c.aggregate_id(),
            NotebookCommand::RenameNote(c) => c.aggregate_id(),
            NotebookCommand::MoveNote(c) => c.aggregate_id(),
            NotebookCommand::TagNote(c) => c.aggregate_id(),
            NotebookCommand::UntagNote(c) => c.aggregate_id(),
            NotebookCommand::DeleteNote(c) => c.aggregate_id(),
            NotebookCommand::CreateTag(c) => c.aggregate_id(),
            NotebookCommand::RenameTag(c) => c.aggregate_id(),
            NotebookCommand::RecolorTag(c) => c.aggregate_id(),
            NotebookCommand::DeleteTag(c) => c.aggregate_id(),
            NotebookCommand::CreateTodo(c) => c.aggregate_id(),
            NotebookCommand::ChangeTodoText(c) => c.aggregate_id(),
            NotebookCommand::CompleteTodo(c) => c.aggregate_id(),
            NotebookCommand::ReopenTodo(c) => c.aggregate_id(),
            NotebookCommand::SetTodoPriority(c) => c.aggregate_id(),
            NotebookCommand::SetTodoDueDate(c) => c.aggregate_id(),
            NotebookCommand::MoveTodo(c) => c.aggregate_id(),
            NotebookCommand::TagTodo(c) => c.aggregate_id(),
            NotebookCommand::UntagTodo(c) => c.aggregate_id(),
            NotebookCommand::DeleteTodo(c) => c.aggregate_id(),
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            NotebookCommand::CreateCategory(_) => "CreateCategory",
            NotebookCommand::RenameCategory(_) => "RenameCategory",
            NotebookCommand::MoveCategory(_) => "MoveCategory",
            NotebookCommand::DeleteCategory(_) => "DeleteCategory",
            NotebookCommand::CreateNote(_) => "CreateNote",
            NotebookCommand::RenameNote(_) => "RenameNote",
            NotebookCommand::MoveNote(_) => "MoveNote",
            NotebookCommand::TagNote(_) => "TagNote",
            NotebookCommand::UntagNote(_) => "UntagNote",
            NotebookCommand::DeleteNote(_) => "DeleteNote",
            NotebookCommand::CreateTag(_) => "CreateTag",
            NotebookCommand::RenameTag(_) => "RenameTag",
            NotebookCommand::RecolorTag(_) => "RecolorTag",
            NotebookCommand::DeleteTag(_) => "DeleteTag",
            NotebookCommand::CreateTodo(_) => "CreateTodo",
            NotebookCommand::ChangeTodoText(_) => "ChangeTodoText",
            NotebookCommand::CompleteTodo(_) => "CompleteTodo",
            NotebookCommand::ReopenTodo(_) => "ReopenTodo",
            NotebookCommand::SetTodoPriority(_) => "SetTodoPriority",
            NotebookCommand::SetTodoDueDate(_) => "SetTodoDueDate",
            NotebookCommand::MoveTodo(_) => "MoveTodo",
            NotebookCommand::TagTodo(_) => "TagTodo",
            NotebookCommand::UntagTodo(_) => "UntagTodo",
            NotebookCommand::DeleteTodo(_) => "DeleteTodo",
        }
    }
}

macro_rules! impl_from_command {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for NotebookCommand {
                fn from(cmd: $variant) -> Self {
                    NotebookCommand::$variant(cmd)
                }
            }
        )*
    };
}

impl_from_command!(
    CreateCategory,
    RenameCategory,
    MoveCategory,
    DeleteCategory,
    CreateNote,
    RenameNote,
    MoveNote,
    TagNote,
    UntagNote,
    DeleteNote,
    CreateTag,
    RenameTag,
    RecolorTag,
    DeleteTag,
    CreateTodo,
    ChangeTodoText,
    CompleteTodo,
    ReopenTodo,
    SetTodoPriority,
    SetTodoDueDate,
    MoveTodo,
    TagTodo,
    UntagTodo,
    DeleteTodo,
);

/// What a successful command wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub stream_id: AggregateId,
    pub new_version: Version,
    /// Global position of the last event written.
    pub last_position: Position,
    pub events: Vec<NotebookEvent>,
}

impl CommandOutcome {
    fn from_result<A: Aggregate>(stream_id: AggregateId, result: CommandResult<A>) -> Self {
        Self {
            stream_id,
            new_version: result.new_version,
            last_position: result.last_position,
            events: result
                .events
                .into_iter()
                .map(DomainEvent::into_notebook)
                .collect(),
        }
    }
}

/// Accepts commands and reports what they wrote.
#[async_trait]
pub trait CommandBus: Send + Sync {
    async fn send(&self, command: NotebookCommand) -> Result<CommandOutcome, DomainError>;
}

/// Command bus that routes each command to its aggregate's service.
pub struct NotebookCommandBus<S: EventStore> {
    categories: CategoryService<S>,
    notes: NoteService<S>,
    tags: TagService<S>,
    todos: TodoService<S>,
}

impl<S: EventStore + Clone> NotebookCommandBus<S> {
    pub fn new(store: S, serializer: EventSerializer) -> Self {
        Self::with_retry_policy(store, serializer, RetryPolicy::default())
    }

    pub fn with_retry_policy(store: S, serializer: EventSerializer, retry: RetryPolicy) -> Self {
        Self {
            categories: CategoryService::new(store.clone(), serializer.clone())
                .with_retry_policy(retry),
            notes: NoteService::new(store.clone(), serializer.clone()).with_retry_policy(retry),
            tags: TagService::new(store.clone(), serializer.clone()).with_retry_policy(retry),
            todos: TodoService::new(store, serializer).with_retry_policy(retry),
        }
    }

    pub fn categories(&self) -> &CategoryService<S> {
        &self.categories
    }

    pub fn notes(&self) -> &NoteService<S> {
        &self.notes
    }

    pub fn tags(&self) -> &TagService<S> {
        &self.tags
    }

    pub fn todos(&self) -> &TodoService<S> {
        &self.todos
    }
}

#[async_trait]
impl<S: EventStore + Clone> CommandBus for NotebookCommandBus<S> {
    #[tracing::instrument(skip(self, command), fields(command = command.name(), stream_id = %command.aggregate_id()))]
    async fn send(&self, command: NotebookCommand) -> Result<CommandOutcome, DomainError> {
        let stream_id = command.aggregate_id();
        let outcome = match command {
            NotebookCommand::CreateCategory(c) => {
                CommandOutcome::from_result(stream_id, self.categories.create_category(c).await?)
            }
            NotebookCommand::RenameCategory(c) => {
                CommandOutcome::from_result(stream_id, self.categories.rename_category(c).await?)
            }
            NotebookCommand::MoveCategory(c) => {
                CommandOutcome::from_result(stream_id, self.categories.move_category(c).await?)
            }
            NotebookCommand::DeleteCategory(c) => {
                CommandOutcome::from_result(stream_id, self.categories.delete_category(c).await?)
            }
            NotebookCommand::CreateNote(c) => {
                CommandOutcome::from_result(stream_id, self.notes.create_note(c).await?)
            }
            NotebookCommand::RenameNote(c) => {
                CommandOutcome::from_result(stream_id, self.notes.rename_note(c).await?)
            }
            NotebookCommand::MoveNote(c) => {
                CommandOutcome::from_result(stream_id, self.notes.move_note(c).await?)
            }
            NotebookCommand::TagNote(c) => {
                CommandOutcome::from_result(stream_id, self.notes.tag_note(c).await?)
            }
            NotebookCommand::UntagNote(c) => {
                CommandOutcome::from_result(stream_id, self.notes.untag_note(c).await?)
            }
            NotebookCommand::DeleteNote(c) => {
                CommandOutcome::from_result(stream_id, self.notes.delete_note(c).await?)
            }
            NotebookCommand::CreateTag(c) => {
                CommandOutcome::from_result(stream_id, self.tags.create_tag(c).await?)
            }
            NotebookCommand::RenameTag(c) => {
                CommandOutcome::from_result(stream_id, self.tags.rename_tag(c).await?)
            }
            NotebookCommand::RecolorTag(c) => {
                CommandOutcome::from_result(stream_id, self.tags.recolor_tag(c).await?)
            }
            NotebookCommand::DeleteTag(c) => {
                CommandOutcome::from_result(stream_id, self.tags.delete_tag(c).await?)
            }
            NotebookCommand::CreateTodo(c) => {
                CommandOutcome::from_result(stream_id, self.todos.create_todo(c).await?)
            }
            NotebookCommand::ChangeTodoText(c) => {
                CommandOutcome::from_result(stream_id, self.todos.change_text(c).await?)
            }
            NotebookCommand::CompleteTodo(c) => {
                CommandOutcome::from_result(stream_id, self.todos.complete_todo(c).await?)
            }
            NotebookCommand::ReopenTodo(c) => {
                CommandOutcome::from_result(stream_id, self.todos.reopen_todo(c).await?)
            }
            NotebookCommand::SetTodoPriority(c) => {
                CommandOutcome::from_result(stream_id, self.todos.set_priority(c).await?)
            }
            NotebookCommand::SetTodoDueDate(c) => {
                CommandOutcome::from_result(stream_id, self.todos.set_due_date(c).await?)
            }
            NotebookCommand::MoveTodo(c) => {
                CommandOutcome::from_result(stream_id, self.todos.move_todo(c).await?)
            }
            NotebookCommand::TagTodo(c) => {
                CommandOutcome::from_result(stream_id, self.todos.tag_todo(c).await?)
            }
            NotebookCommand::UntagTodo(c) => {
                CommandOutcome::from_result(stream_id, self.todos.untag_todo(c).await?)
            }
            NotebookCommand::DeleteTodo(c) => {
                CommandOutcome::from_result(stream_id, self.todos.delete_todo(c).await?)
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_store::InMemoryEventStore;

    fn bus() -> NotebookCommandBus<InMemoryEventStore> {
        NotebookCommandBus::new(InMemoryEventStore::new(), EventSerializer::standard().unwrap())
    }

    #[tokio::test]
    async fn test_send_routes_to_the_owning_service() {
        let bus = bus();
        let create = CreateCategory::new("Projects", None);
        let category_id = create.category_id;

        let created = bus.send(create.into()).await.unwrap();
        assert_eq!(created.stream_id, category_id);
        assert_eq!(created.new_version, Version::first());
        assert_eq!(created.events[0].event_type(), "CategoryCreated");

        let renamed = bus
            .send(RenameCategory::new(category_id, "Work").into())
            .await
            .unwrap();
        assert_eq!(renamed.new_version, Version::new(2));
        assert_eq!(renamed.last_position, Position::new(2));

        let category = bus.categories().get_category(category_id).await.unwrap();
        assert_eq!(category.unwrap().name(), "Work");
    }

    #[tokio::test]
    async fn test_rejections_come_back_as_domain_errors() {
        let bus = bus();
        let err = bus
            .send(CreateNote::new("   ", None).into())
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = bus
            .send(CompleteTodo::new(AggregateId::new()).into())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AggregateNotFound { .. }));
    }
}
