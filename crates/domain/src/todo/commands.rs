//! Todo commands.

use chrono::NaiveDate;
use common::AggregateId;

use crate::command::Command;

use super::TodoItem;

/// Command to create a new todo.
#[derive(Debug, Clone)]
pub struct CreateTodo {
    /// The todo ID to create.
    pub todo_id: AggregateId,

    pub text: String,

    pub category_id: Option<AggregateId>,

    /// Priority level, 0 (low) to 3 (urgent).
    pub priority: u8,

    pub due_date: Option<NaiveDate>,
}

impl CreateTodo {
    /// Creates a normal-priority, uncategorised todo with a generated ID.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            todo_id: AggregateId::new(),
            text: text.into(),
            category_id: None,
            priority: 1,
            due_date: None,
        }
    }

    pub fn in_category(mut self, category_id: AggregateId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn due(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

impl Command for CreateTodo {
    type Aggregate = TodoItem;

    fn aggregate_id(&self) -> AggregateId {
        self.todo_id
    }
}

/// Command to edit a todo's text.
#[derive(Debug, Clone)]
pub struct ChangeTodoText {
    pub todo_id: AggregateId,
    pub text: String,
}

impl ChangeTodoText {
    pub fn new(todo_id: AggregateId, text: impl Into<String>) -> Self {
        Self {
            todo_id,
            text: text.into(),
        }
    }
}

impl Command for ChangeTodoText {
    type Aggregate = TodoItem;

    fn aggregate_id(&self) -> AggregateId {
        self.todo_id
    }
}

/// Command to mark a todo as done.
#[derive(Debug, Clone)]
pub struct CompleteTodo {
    pub todo_id: AggregateId,
}

impl CompleteTodo {
    pub fn new(todo_id: AggregateId) -> Self {
        Self { todo_id }
    }
}

impl Command for CompleteTodo {
    type Aggregate = TodoItem;

    fn aggregate_id(&self) -> AggregateId {
        self.todo_id
    }
}

/// Command to mark a completed todo as not done.
#[derive(Debug, Clone)]
pub struct ReopenTodo {
    pub todo_id: AggregateId,
}

impl ReopenTodo {
    pub fn new(todo_id: AggregateId) -> Self {
        Self { todo_id }
    }
}

impl Command for ReopenTodo {
    type Aggregate = TodoItem;

    fn aggregate_id(&self) -> AggregateId {
        self.todo_id
    }
}

/// Command to change a todo's priority level.
#[derive(Debug, Clone)]
pub struct SetTodoPriority {
    pub todo_id: AggregateId,
    pub priority: u8,
}

impl SetTodoPriority {
    pub fn new(todo_id: AggregateId, priority: u8) -> Self {
        Self { todo_id, priority }
    }
}

impl Command for SetTodoPriority {
    type Aggregate = TodoItem;

    fn aggregate_id(&self) -> AggregateId {
        self.todo_id
    }
}

/// Command to set or clear a todo's due date.
#[derive(Debug, Clone)]
pub struct SetTodoDueDate {
    pub todo_id: AggregateId,
    pub due_date: Option<NaiveDate>,
}

impl SetTodoDueDate {
    pub fn new(todo_id: AggregateId, due_date: Option<NaiveDate>) -> Self {
        Self { todo_id, due_date }
    }
}

impl Command for SetTodoDueDate {
    type Aggregate = TodoItem;

    fn aggregate_id(&self) -> AggregateId {
        self.todo_id
    }
}

/// Command to move a todo to another category.
#[derive(Debug, Clone)]
pub struct MoveTodo {
    pub todo_id: AggregateId,
    pub category_id: Option<AggregateId>,
}

impl MoveTodo {
    pub fn new(todo_id: AggregateId, category_id: Option<AggregateId>) -> Self {
        Self {
            todo_id,
            category_id,
        }
    }
}

impl Command for MoveTodo {
    type Aggregate = TodoItem;

    fn aggregate_id(&self) -> AggregateId {
        self.todo_id
    }
}

/// Command to attach a tag to a todo.
#[derive(Debug, Clone)]
pub struct TagTodo {
    pub todo_id: AggregateId,
    pub tag_id: AggregateId,
}

impl TagTodo {
    pub fn new(todo_id: AggregateId, tag_id: AggregateId) -> Self {
        Self { todo_id, tag_id }
    }
}

impl Command for TagTodo {
    type Aggregate = TodoItem;

    fn aggregate_id(&self) -> AggregateId {
        self.todo_id
    }
}

/// Command to detach a tag from a todo.
#[derive(Debug, Clone)]
pub struct UntagTodo {
    pub todo_id: AggregateId,
    pub tag_id: AggregateId,
}

impl UntagTodo {
    pub fn new(todo_id: AggregateId, tag_id: AggregateId) -> Self {
        Self { todo_id, tag_id }
    }
}

impl Command for UntagTodo {
    type Aggregate = TodoItem;

    fn aggregate_id(&self) -> AggregateId {
        self.todo_id
    }
}

/// Command to delete a todo.
#[derive(Debug, Clone)]
pub struct DeleteTodo {
    pub todo_id: AggregateId,
}

impl DeleteTodo {
    pub fn new(todo_id: AggregateId) -> Self {
        Self { todo_id }
    }
}

impl Command for DeleteTodo {
    type Aggregate = TodoItem;

    fn aggregate_id(&self) -> AggregateId {
        self.todo_id
    }
}
