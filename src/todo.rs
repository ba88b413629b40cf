//! In-memory to-do store for the operations team.
//!
//! An item is always in exactly one of three states. The status is a
//! single enum field, so the exactly-one invariant holds structurally and
//! a half-updated item can never be observed; the per-flag view the table
//! wants is derived on read.

use serde::{Deserialize, Serialize};

use crate::error::TaskLogError;

/// Status of a to-do item. Exactly one applies at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoStatus {
    Completed,
    Delayed,
    Missed,
}

impl TodoStatus {
    pub fn is_completed(self) -> bool {
        self == TodoStatus::Completed
    }

    pub fn is_delayed(self) -> bool {
        self == TodoStatus::Delayed
    }

    pub fn is_missed(self) -> bool {
        self == TodoStatus::Missed
    }
}

/// Priority of a to-do item. Ordering is display order: High sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TodoPriority {
    High,
    Medium,
    Low,
}

/// One entry in the to-do list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Store-assigned identifier.
    pub id: u64,

    /// Free-text description.
    pub task: String,

    pub priority: TodoPriority,

    pub status: TodoStatus,
}

/// The in-memory list. One per user session; items are never deleted.
#[derive(Debug, Default)]
pub struct TodoStore {
    items: Vec<TodoItem>,
    next_id: u64,
}

impl TodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item and return its id.
    pub fn add(&mut self, task: &str, priority: TodoPriority, status: TodoStatus) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.items.push(TodoItem {
            id,
            task: task.to_string(),
            priority,
            status,
        });

        id
    }

    /// Replace an item's status in a single assignment.
    pub fn update_status(&mut self, id: u64, status: TodoStatus) -> Result<(), TaskLogError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(TaskLogError::UnknownTodo(id))?;

        item.status = status;
        Ok(())
    }

    /// Look up an item by id.
    pub fn get(&self, id: u64) -> Option<&TodoItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// All items in display order: High before Medium before Low, insertion
    /// order within a priority.
    pub fn items(&self) -> Vec<TodoItem> {
        let mut items = self.items.clone();
        items.sort_by_key(|item| item.priority);
        items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_assigns_sequential_ids() {
        let mut store = TodoStore::new();

        let a = store.add("Check boiler", TodoPriority::High, TodoStatus::Missed);
        let b = store.add("Swap filters", TodoPriority::Low, TodoStatus::Delayed);

        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_update_status_is_exclusive() {
        let mut store = TodoStore::new();
        let id = store.add("Check boiler", TodoPriority::High, TodoStatus::Missed);

        let before = &store.items()[0];
        assert!(before.status.is_missed());
        assert!(!before.status.is_completed());
        assert!(!before.status.is_delayed());

        store.update_status(id, TodoStatus::Completed).unwrap();

        let after = &store.items()[0];
        assert!(after.status.is_completed());
        assert!(!after.status.is_missed());
        assert!(!after.status.is_delayed());
    }

    #[test]
    fn test_update_unknown_id() {
        let mut store = TodoStore::new();

        let err = store.update_status(42, TodoStatus::Completed).unwrap_err();
        assert!(matches!(err, TaskLogError::UnknownTodo(42)));
    }

    #[test]
    fn test_items_sorted_by_priority_then_insertion() {
        let mut store = TodoStore::new();
        store.add("low first", TodoPriority::Low, TodoStatus::Delayed);
        store.add("high", TodoPriority::High, TodoStatus::Missed);
        store.add("medium", TodoPriority::Medium, TodoStatus::Completed);
        store.add("low second", TodoPriority::Low, TodoStatus::Completed);

        let tasks: Vec<_> = store.items().into_iter().map(|i| i.task).collect();

        assert_eq!(tasks, vec!["high", "medium", "low first", "low second"]);
    }
}
