//! In-memory cache of the signed-in user's tasks.
//!
//! The cache is replaced wholesale by [`TaskStore::load`]; a failed load
//! leaves the previous snapshot in place. Filtering is pure and always
//! re-derived from the full set.

use tracing::debug;
use uuid::Uuid;

use crate::backend::{DataAccess, Filter, Order, Table};
use crate::error::{Error, Result};
use crate::fields::*;
use crate::task::Task;

/// Search and filter controls of the task list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub search: String,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub status: StatusFilter,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if !task.is_active() {
            return false;
        }
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Active => !task.completed,
            StatusFilter::Completed => task.completed,
        };
        if !status_ok {
            return false;
        }
        if self.category.is_some_and(|c| c != task.category) {
            return false;
        }
        if self.priority.is_some_and(|p| p != task.priority) {
            return false;
        }
        let needle = self.search.to_lowercase();
        needle.is_empty()
            || task.title.to_lowercase().contains(&needle)
            || task
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }

    pub fn is_default(&self) -> bool {
        *self == TaskFilter::default()
    }
}

/// Non-archived tasks passing `filter`, in stored order.
pub fn filter<'a>(tasks: &'a [Task], filter: &TaskFilter) -> Vec<&'a Task> {
    tasks.iter().filter(|t| filter.matches(t)).collect()
}

/// Snapshot of one user's tasks, ordered by `order_index`.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// Fetch every task of `user_id` ordered by `order_index`.
    pub fn fetch(backend: &dyn DataAccess, user_id: Uuid) -> Result<Vec<Task>> {
        let rows = backend.select(
            Table::Tasks,
            &[Filter::eq("user_id", user_id)],
            Some(&Order::asc("order_index")),
        )?;
        rows.into_iter().map(Task::from_row).collect()
    }

    /// Replace the snapshot; on failure the previous snapshot is kept.
    pub fn load(&mut self, backend: &dyn DataAccess, user_id: Uuid) -> Result<()> {
        let tasks = Self::fetch(backend, user_id)?;
        debug!(count = tasks.len(), "tasks loaded");
        self.tasks = tasks;
        Ok(())
    }

    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn active(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| !t.archived).collect()
    }

    pub fn archived(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.archived).collect()
    }

    pub fn filtered(&self, f: &TaskFilter) -> Vec<&Task> {
        filter(&self.tasks, f)
    }

    /// Resolve a full id, a unique id prefix, or an exact (case-insensitive) title.
    pub fn resolve(&self, identifier: &str) -> Result<Uuid> {
        let needle = identifier.trim();
        if let Ok(id) = Uuid::parse_str(needle) {
            return self
                .get(id)
                .map(|t| t.id)
                .ok_or_else(|| Error::NotFound(format!("task with ID {id}")));
        }

        let lower = needle.to_lowercase();
        let by_prefix: Vec<&Task> = if lower.len() >= 4 {
            self.tasks
                .iter()
                .filter(|t| t.id.to_string().starts_with(&lower))
                .collect()
        } else {
            Vec::new()
        };
        let matches = if by_prefix.is_empty() {
            self.tasks
                .iter()
                .filter(|t| t.title.to_lowercase() == lower)
                .collect()
        } else {
            by_prefix
        };

        match matches.len() {
            0 => Err(Error::NotFound(format!("no task matching '{needle}'"))),
            1 => Ok(matches[0].id),
            _ => {
                let mut msg = format!("Multiple tasks match '{needle}':\n");
                for task in matches {
                    msg.push_str(&format!("  {}  {}\n", short_id(task.id), task.title));
                }
                msg.push_str("Please use a longer ID prefix instead.");
                Err(Error::Ambiguous(msg))
            }
        }
    }
}

/// First eight hex digits of an id, as shown in tables.
pub fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}
