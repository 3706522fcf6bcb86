//! TodoItem aggregate implementation.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, Changeset};
use crate::validation::TODO_TEXT;

use super::{Priority, TodoError, TodoEvent};

/// TodoItem aggregate root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    id: Option<AggregateId>,
    #[serde(default)]
    version: Version,
    text: String,
    category_id: Option<AggregateId>,
    priority: Priority,
    due_date: Option<NaiveDate>,
    completed_at: Option<DateTime<Utc>>,
    tags: BTreeSet<AggregateId>,
    deleted: bool,
}

impl Aggregate for TodoItem {
    type Event = TodoEvent;
    type Error = TodoError;

    fn aggregate_type() -> &'static str {
        "TodoItem"
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
            TodoEvent::TodoCreated(data) => {
                self.id = Some(data.todo_id);
                self.text = data.text.clone();
                self.category_id = data.category_id;
                self.priority = data.priority;
                self.due_date = data.due_date;
            }
            TodoEvent::TodoTextChanged(data) => self.text = data.text.clone(),
            TodoEvent::TodoCompleted(data) => self.completed_at = Some(data.completed_at),
            TodoEvent::TodoReopened(_) => self.completed_at = None,
            TodoEvent::TodoPriorityChanged(data) => self.priority = data.priority,
            TodoEvent::TodoDueDateChanged(data) => self.due_date = data.due_date,
            TodoEvent::TodoMoved(data) => self.category_id = data.category_id,
            TodoEvent::TodoTagged(data) => {
                self.tags.insert(data.tag_id);
            }
            TodoEvent::TodoUntagged(data) => {
                self.tags.remove(&data.tag_id);
            }
            TodoEvent::TodoDeleted(_) => self.deleted = true,
        }
        self
    }
}

// Query methods
impl TodoItem {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn category_id(&self) -> Option<AggregateId> {
        self.category_id
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn tags(&self) -> &BTreeSet<AggregateId> {
        &self.tags
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}

// Command methods (return events)
impl TodoItem {
    /// Validates the inputs and starts a new todo stream.
    ///
    /// `priority` is a raw level from the UI; see [`Priority`].
    pub fn create_new(
        id: AggregateId,
        text: &str,
        category_id: Option<AggregateId>,
        priority: u8,
        due_date: Option<NaiveDate>,
    ) -> Result<Changeset<Self>, TodoError> {
        let text = TODO_TEXT.check(text)?;
        let priority = Priority::try_from(priority)?;
        Ok(Changeset::created(TodoEvent::todo_created(
            id,
            text,
            category_id,
            priority,
            due_date,
        )))
    }

    pub fn change_text(&self, text: &str) -> Result<TodoEvent, TodoError> {
        self.ensure_live()?;
        let text = TODO_TEXT.check(text)?;
        if text == self.text {
            return Err(TodoError::Unchanged { field: "text" });
        }
        Ok(TodoEvent::todo_text_changed(text))
    }

    pub fn complete(&self) -> Result<TodoEvent, TodoError> {
        self.ensure_live()?;
        if self.is_completed() {
            return Err(TodoError::AlreadyCompleted);
        }
        Ok(TodoEvent::todo_completed())
    }

    pub fn reopen(&self) -> Result<TodoEvent, TodoError> {
        self.ensure_live()?;
        if !self.is_completed() {
            return Err(TodoError::NotCompleted);
        }
        Ok(TodoEvent::todo_reopened())
    }

    pub fn set_priority(&self, level: u8) -> Result<TodoEvent, TodoError> {
        self.ensure_live()?;
        let priority = Priority::try_from(level)?;
        if priority == self.priority {
            return Err(TodoError::Unchanged { field: "priority" });
        }
        Ok(TodoEvent::todo_priority_changed(priority))
    }

    pub fn set_due_date(&self, due_date: Option<NaiveDate>) -> Result<TodoEvent, TodoError> {
        self.ensure_live()?;
        if due_date == self.due_date {
            return Err(TodoError::Unchanged { field: "due date" });
        }
        Ok(TodoEvent::todo_due_date_changed(due_date))
    }

    pub fn move_to(&self, category_id: Option<AggregateId>) -> Result<TodoEvent, TodoError> {
        self.ensure_live()?;
        if category_id == self.category_id {
            return Err(TodoError::Unchanged { field: "category" });
        }
        Ok(TodoEvent::todo_moved(category_id))
    }

    pub fn add_tag(&self, tag_id: AggregateId) -> Result<TodoEvent, TodoError> {
        self.ensure_live()?;
        if self.tags.contains(&tag_id) {
            return Err(TodoError::AlreadyTagged { tag_id });
        }
        Ok(TodoEvent::todo_tagged(tag_id))
    }

    pub fn remove_tag(&self, tag_id: AggregateId) -> Result<TodoEvent, TodoError> {
        self.ensure_live()?;
        if !self.tags.contains(&tag_id) {
            return Err(TodoError::NotTagged { tag_id });
        }
        Ok(TodoEvent::todo_untagged(tag_id))
    }

    pub fn delete(&self) -> Result<TodoEvent, TodoError> {
        self.ensure_live()?;
        Ok(TodoEvent::todo_deleted())
    }

    fn ensure_live(&self) -> Result<(), TodoError> {
        if self.id.is_none() {
            return Err(TodoError::NotCreated);
        }
        if self.deleted {
            return Err(TodoError::Deleted);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buy_milk() -> Changeset<TodoItem> {
        TodoItem::create_new(AggregateId::new(), "Buy milk", None, 1, None).unwrap()
    }

    #[test]
    fn test_create_todo() {
        let due = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let changeset =
            TodoItem::create_new(AggregateId::new(), " Buy milk ", None, 2, Some(due)).unwrap();
        let todo = changeset.aggregate();

        assert_eq!(todo.text(), "Buy milk");
        assert_eq!(todo.priority(), Priority::High);
        assert_eq!(todo.due_date(), Some(due));
        assert!(!todo.is_completed());
    }

    #[test]
    fn test_create_rejects_bad_priority_and_text() {
        let id = AggregateId::new();
        assert_eq!(
            TodoItem::create_new(id, "x", None, 7, None).unwrap_err(),
            TodoError::InvalidPriority(7)
        );
        assert!(matches!(
            TodoItem::create_new(id, &"x".repeat(501), None, 1, None),
            Err(TodoError::InvalidText(_))
        ));
    }

    #[test]
    fn test_complete_twice_is_rejected_and_changes_nothing() {
        let mut changeset = buy_milk();
        changeset.record(|t| t.complete()).unwrap();
        let before = changeset.aggregate().clone();

        let result = changeset.record(|t| t.complete());

        assert_eq!(result, Err(TodoError::AlreadyCompleted));
        assert_eq!(changeset.aggregate(), &before);
        assert_eq!(changeset.aggregate().version(), Version::new(2));
        assert_eq!(changeset.uncommitted().len(), 2);
    }

    #[test]
    fn test_reopen() {
        let mut changeset = buy_milk();
        assert_eq!(changeset.record(|t| t.reopen()), Err(TodoError::NotCompleted));
        changeset.record(|t| t.complete()).unwrap();
        changeset.record(|t| t.reopen()).unwrap();
        assert!(!changeset.aggregate().is_completed());
    }

    #[test]
    fn test_priority_changes() {
        let mut changeset = buy_milk();
        assert_eq!(
            changeset.record(|t| t.set_priority(1)),
            Err(TodoError::Unchanged { field: "priority" })
        );
        assert_eq!(
            changeset.record(|t| t.set_priority(9)),
            Err(TodoError::InvalidPriority(9))
        );
        changeset.record(|t| t.set_priority(3)).unwrap();
        assert_eq!(changeset.aggregate().priority(), Priority::Urgent);
    }

    #[test]
    fn test_deleted_todo_cannot_be_completed() {
        let mut changeset = buy_milk();
        changeset.record(|t| t.delete()).unwrap();
        assert_eq!(changeset.record(|t| t.complete()), Err(TodoError::Deleted));
    }

    #[test]
    fn test_replay_matches_live_state() {
        let tag = AggregateId::new();
        let mut changeset = buy_milk();
        changeset.record(|t| t.add_tag(tag)).unwrap();
        changeset.record(|t| t.complete()).unwrap();
        changeset
            .record(|t| t.set_due_date(NaiveDate::from_ymd_opt(2030, 1, 1)))
            .unwrap();
        changeset.record(|t| t.change_text("Buy oat milk")).unwrap();

        let (live, _, events) = changeset.into_parts();
        assert_eq!(TodoItem::load_from_history(&events), live);
    }
}
