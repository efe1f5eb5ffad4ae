/// Task model
///
/// A task belongs to exactly one list for its whole lifetime; `list_id` is
/// set at insert time and no operation reassigns it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     list_id BIGINT NOT NULL REFERENCES todo_lists(id),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     completed BOOLEAN NOT NULL DEFAULT FALSE
/// );
/// ```

use serde::{Deserialize, Serialize};

use super::todo_list::ListId;

/// Stable numeric task identity
pub type TaskId = i64;

/// Persisted task
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Task {
    pub id: TaskId,
    pub list_id: ListId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
}

/// Input for creating a task under a list
#[derive(Debug, Clone)]
pub struct NewTask {
    pub list_id: ListId,
    pub title: String,
    pub description: Option<String>,
}

/// Full replacement of a task's mutable fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
}

impl Task {
    /// Overwrites every mutable field
    pub fn apply(&mut self, update: TaskUpdate) {
        self.title = update.title;
        self.description = update.description;
        self.completed = update.completed;
    }

    pub fn projection(&self) -> TaskProjection {
        TaskProjection {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            completed: self.completed,
        }
    }
}

/// Public task view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProjection {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_replaces_all_fields() {
        let mut task = Task {
            id: 1,
            list_id: 3,
            title: "Milk".to_string(),
            description: Some("2 liters".to_string()),
            completed: false,
        };

        task.apply(TaskUpdate {
            title: "Oat milk".to_string(),
            description: None,
            completed: true,
        });

        assert_eq!(task.title, "Oat milk");
        assert!(task.description.is_none());
        assert!(task.completed);
        assert_eq!(task.list_id, 3);
    }
}
