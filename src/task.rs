//! Task data structure and related functionality.
//!
//! `Task` mirrors one row of the `tasks` table. `TaskDraft` is the
//! user-editable subset used for both creation and editing, and for
//! spawning the successor of a completed recurring task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::backend::Row;
use crate::error::{Error, Result};
use crate::fields::*;

/// A single task owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub deadline: DateTime<Utc>,
    pub priority: Priority,
    pub category: Category,
    #[serde(default)]
    pub recurring: Recurring,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub order_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Decode a backend row.
    pub fn from_row(row: Row) -> Result<Self> {
        serde_json::from_value(Value::Object(row))
            .map_err(|e| Error::DataAccess(format!("malformed task row: {e}")))
    }

    /// True when the task shows up in active views.
    pub fn is_active(&self) -> bool {
        !self.archived
    }

    /// Pending and past its deadline.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.deadline < now
    }
}

/// User-editable fields of a task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub deadline: DateTime<Utc>,
    pub priority: Priority,
    pub category: Category,
    pub recurring: Recurring,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, deadline: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: None,
            deadline,
            priority: Priority::Medium,
            category: Category::Personal,
            recurring: Recurring::None,
        }
    }

    /// Prefill from an existing task (edit form).
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            deadline: task.deadline,
            priority: task.priority,
            category: task.category,
            recurring: task.recurring,
        }
    }

    /// Next instance of a recurring task: same content, new deadline.
    pub fn successor_of(task: &Task, deadline: DateTime<Utc>) -> Self {
        Self {
            deadline,
            ..Self::from_task(task)
        }
    }

    /// Required fields must be present before anything is sent.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("Task title is required".into()));
        }
        Ok(())
    }

    fn normalised_description(&self) -> Value {
        match self.description.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => Value::String(d.to_string()),
            _ => Value::Null,
        }
    }

    /// Columns written by an edit.
    pub fn to_patch(&self) -> Row {
        let mut row = Row::new();
        row.insert("title".into(), json!(self.title.trim()));
        row.insert("description".into(), self.normalised_description());
        row.insert("deadline".into(), json!(self.deadline));
        row.insert("priority".into(), json!(self.priority));
        row.insert("category".into(), json!(self.category));
        row.insert("recurring".into(), json!(self.recurring));
        row
    }

    /// Full insert row for a fresh, incomplete, unarchived task.
    pub fn to_insert_row(&self, user_id: Uuid, order_index: i64) -> Row {
        let mut row = self.to_patch();
        row.insert("user_id".into(), json!(user_id));
        row.insert("completed".into(), json!(false));
        row.insert("archived".into(), json!(false));
        row.insert("order_index".into(), json!(order_index));
        row
    }
}

/// Row of the `profiles` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl Profile {
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("User")
    }
}
