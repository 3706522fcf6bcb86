//! Todo service providing a simplified API for todo operations.

use common::AggregateId;
use event_store::EventStore;

use crate::command::{CommandHandler, CommandResult, RetryPolicy};
use crate::error::DomainError;
use crate::reference::References;
use crate::serializer::EventSerializer;

use super::{
    ChangeTodoText, CompleteTodo, CreateTodo, DeleteTodo, MoveTodo, ReopenTodo, SetTodoDueDate,
    SetTodoPriority, TagTodo, TodoItem, UntagTodo,
};

/// Service for managing todos.
pub struct TodoService<S: EventStore> {
    handler: CommandHandler<S, TodoItem>,
    references: References<S>,
}

impl<S: EventStore + Clone> TodoService<S> {
    /// Creates a new todo service with the given event store.
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
    pub fn handler(&self) -> &CommandHandler<S, TodoItem> {
        &self.handler
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_todo(&self, cmd: CreateTodo) -> Result<CommandResult<TodoItem>, DomainError> {
        self.references
            .require_optional_category(cmd.category_id)
            .await?;
        let changeset = TodoItem::create_new(
            cmd.todo_id,
            &cmd.text,
            cmd.category_id,
            cmd.priority,
            cmd.due_date,
        )?;
        self.handler.create(changeset).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn change_text(
        &self,
        cmd: ChangeTodoText,
    ) -> Result<CommandResult<TodoItem>, DomainError> {
        self.handler
            .execute(cmd.todo_id, |todo| todo.change_text(&cmd.text))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn complete_todo(
        &self,
        cmd: CompleteTodo,
    ) -> Result<CommandResult<TodoItem>, DomainError> {
        self.handler
            .execute(cmd.todo_id, |todo| todo.complete())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn reopen_todo(&self, cmd: ReopenTodo) -> Result<CommandResult<TodoItem>, DomainError> {
        self.handler.execute(cmd.todo_id, |todo| todo.reopen()).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn set_priority(
        &self,
        cmd: SetTodoPriority,
    ) -> Result<CommandResult<TodoItem>, DomainError> {
        self.handler
            .execute(cmd.todo_id, |todo| todo.set_priority(cmd.priority))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn set_due_date(
        &self,
        cmd: SetTodoDueDate,
    ) -> Result<CommandResult<TodoItem>, DomainError> {
        self.handler
            .execute(cmd.todo_id, |todo| todo.set_due_date(cmd.due_date))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn move_todo(&self, cmd: MoveTodo) -> Result<CommandResult<TodoItem>, DomainError> {
        self.references
            .require_optional_category(cmd.category_id)
            .await?;
        self.handler
            .execute(cmd.todo_id, |todo| todo.move_to(cmd.category_id))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn tag_todo(&self, cmd: TagTodo) -> Result<CommandResult<TodoItem>, DomainError> {
        self.references.require_tag(cmd.tag_id).await?;
        self.handler
            .execute(cmd.todo_id, |todo| todo.add_tag(cmd.tag_id))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn untag_todo(&self, cmd: UntagTodo) -> Result<CommandResult<TodoItem>, DomainError> {
        self.handler
            .execute(cmd.todo_id, |todo| todo.remove_tag(cmd.tag_id))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_todo(&self, cmd: DeleteTodo) -> Result<CommandResult<TodoItem>, DomainError> {
        self.handler.execute(cmd.todo_id, |todo| todo.delete()).await
    }

    /// Loads a todo by ID.
    ///
    /// Returns None if the todo doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_todo(&self, todo_id: AggregateId) -> Result<Option<TodoItem>, DomainError> {
        self.handler.load_existing(todo_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregate;
    use crate::todo::{Priority, TodoError};
    use event_store::{InMemoryEventStore, Version};

    fn service() -> TodoService<InMemoryEventStore> {
        TodoService::new(InMemoryEventStore::new(), EventSerializer::standard().unwrap())
    }

    #[tokio::test]
    async fn test_complete_todo_once() {
        let service = service();
        let cmd = CreateTodo::new("Buy milk");
        let todo_id = cmd.todo_id;
        service.create_todo(cmd).await.unwrap();

        let result = service
            .complete_todo(CompleteTodo::new(todo_id))
            .await
            .unwrap();
        assert_eq!(result.new_version, Version::new(2));

        let again = service.complete_todo(CompleteTodo::new(todo_id)).await;
        assert!(matches!(
            again,
            Err(DomainError::Todo(TodoError::AlreadyCompleted))
        ));

        let reloaded = service.get_todo(todo_id).await.unwrap().unwrap();
        assert!(reloaded.is_completed());
        assert_eq!(reloaded.version(), Version::new(2));
    }

    #[tokio::test]
    async fn test_invalid_priority_is_rejected() {
        let service = service();
        let result = service
            .create_todo(CreateTodo::new("Call mum").with_priority(4))
            .await;
        let err = result.unwrap_err();
        assert!(matches!(err, DomainError::Todo(TodoError::InvalidPriority(4))));
        assert!(err.is_validation());

        let cmd = CreateTodo::new("Call mum").with_priority(3);
        let todo_id = cmd.todo_id;
        let created = service.create_todo(cmd).await.unwrap();
        assert_eq!(created.aggregate.priority(), Priority::Urgent);
        assert_eq!(
            service.get_todo(todo_id).await.unwrap().unwrap().priority(),
            Priority::Urgent
        );
    }
}
