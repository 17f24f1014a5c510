//! Application state and command dispatch.
//!
//! The [`Controller`] owns everything the views read: the backend handle,
//! the signed-in user, the task snapshot, the filter controls, the current
//! view and the calendar selection. User actions arrive as [`Command`]s;
//! each one issues its writes, then reloads the snapshot from the backend.
//! Failures stop at this boundary: they are logged and turned into an
//! error [`Notification`], and the snapshot is left as it was.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::User;
use crate::backend::{DataAccess, Filter, Row, Table};
use crate::error::{Error, Result};
use crate::fields::View;
use crate::ordering::{self, move_item, Partition, ReorderOutcome};
use crate::recurrence::{local_day, next_deadline};
use crate::store::{TaskFilter, TaskStore};
use crate::task::{Task, TaskDraft};
use crate::views::CalendarState;

/// Per-task actions exposed on every task card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    ToggleComplete,
    Archive,
    Unarchive,
    Delete,
}

/// Everything a user can ask the application to do with tasks.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create(TaskDraft),
    Edit(Uuid, TaskDraft),
    Task(TaskAction, Uuid),
    /// End of a drag gesture within one ordering partition.
    Reorder { partition: Partition, from: usize, to: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient message shown after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

type ActionHandler<Tz> = fn(&mut Controller<Tz>, Uuid) -> Result<&'static str>;

/// Owner of the application state.
pub struct Controller<Tz: TimeZone> {
    backend: Box<dyn DataAccess>,
    user: User,
    store: TaskStore,
    tz: Tz,
    pub filter: TaskFilter,
    pub view: View,
    pub calendar: CalendarState,
}

impl<Tz: TimeZone> Controller<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    /// Create a controller with an empty snapshot; call [`Controller::reload`] next.
    pub fn new(backend: Box<dyn DataAccess>, user: User, tz: Tz, now: DateTime<Utc>) -> Self {
        let today = local_day(&now, &tz);
        Self {
            backend,
            user,
            store: TaskStore::new(),
            tz,
            filter: TaskFilter::default(),
            view: View::default(),
            calendar: CalendarState::new(today),
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn tz(&self) -> &Tz {
        &self.tz
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.all()
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn backend(&self) -> &dyn DataAccess {
        self.backend.as_ref()
    }

    /// Replace the snapshot with what the backend holds.
    pub fn reload(&mut self) -> Result<()> {
        self.store.load(self.backend.as_ref(), self.user.id)
    }

    /// Tasks shown in the list view under the current filter.
    pub fn filtered(&self) -> Vec<&Task> {
        self.store.filtered(&self.filter)
    }

    /// Ids in the order the given partition is displayed.
    pub fn displayed_ids(&self, partition: Partition) -> Vec<Uuid> {
        match partition {
            Partition::Active => self.filtered().iter().map(|t| t.id).collect(),
            Partition::Archived => self.store.archived().iter().map(|t| t.id).collect(),
        }
    }

    /// Run a command at the action boundary.
    ///
    /// Returns the notification to show, or `None` when there is nothing to
    /// report (a drag that did not move anything, a successful reorder).
    pub fn dispatch(&mut self, command: Command) -> Option<Notification> {
        match self.execute(command) {
            Ok(message) => message.map(Notification::success),
            Err(e) => {
                error!(user = %self.user.id, "action failed: {e}");
                Some(Notification::error(e.to_string()))
            }
        }
    }

    /// Run a command and hand back its success message, leaving failures to the caller.
    pub fn execute(&mut self, command: Command) -> Result<Option<&'static str>> {
        match command {
            Command::Create(draft) => self.create(draft).map(Some),
            Command::Edit(id, draft) => self.edit(id, draft).map(Some),
            Command::Task(action, id) => Self::task_handler(action)(self, id).map(Some),
            Command::Reorder { partition, from, to } => self.reorder(partition, from, to).map(|_| None),
        }
    }

    fn task_handler(action: TaskAction) -> ActionHandler<Tz> {
        match action {
            TaskAction::ToggleComplete => Self::toggle_complete,
            TaskAction::Archive => Self::archive,
            TaskAction::Unarchive => Self::unarchive,
            TaskAction::Delete => Self::delete,
        }
    }

    fn require_task(&self, id: Uuid) -> Result<Task> {
        self.store
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("task with ID {id}")))
    }

    fn set_flag(&mut self, id: Uuid, column: &str, value: bool) -> Result<()> {
        let mut patch = Row::new();
        patch.insert(column.into(), json!(value));
        self.backend.update(Table::Tasks, &patch, &[Filter::eq("id", id)])
    }

    /// Renumber both orderings after a task entered or left one of them.
    ///
    /// Write failures are logged by the ordering engine; the next reload shows
    /// whatever was persisted.
    fn settle_order(&mut self) -> Result<()> {
        let outcome = ordering::settle(self.backend.as_mut(), self.store.all());
        if outcome != ReorderOutcome::default() {
            self.reload()?;
        }
        Ok(())
    }

    /// Index that puts a new task at the end of the active list.
    fn next_active_index(&self) -> i64 {
        ordering::archive_base(self.store.all())
    }

    fn create(&mut self, draft: TaskDraft) -> Result<&'static str> {
        draft.validate()?;
        let row = draft.to_insert_row(self.user.id, self.next_active_index());
        self.backend.insert(Table::Tasks, vec![row])?;
        info!(title = %draft.title, "task created");
        self.reload()?;
        self.settle_order()?;
        Ok("Task created successfully!")
    }

    fn edit(&mut self, id: Uuid, draft: TaskDraft) -> Result<&'static str> {
        draft.validate()?;
        self.require_task(id)?;
        self.backend.update(Table::Tasks, &draft.to_patch(), &[Filter::eq("id", id)])?;
        info!(task = %id, "task updated");
        self.reload()?;
        Ok("Task updated successfully!")
    }

    fn toggle_complete(&mut self, id: Uuid) -> Result<&'static str> {
        let task = self.require_task(id)?;
        let completed = !task.completed;
        self.set_flag(id, "completed", completed)?;
        info!(task = %id, completed, "completion toggled");

        let spawned = completed && task.recurring.repeats() && self.spawn_successor(&task);

        self.reload()?;
        if spawned {
            self.settle_order()?;
        }
        Ok(if completed { "Task completed!" } else { "Task marked as incomplete" })
    }

    /// Insert the next instance of a completed recurring task.
    ///
    /// A failure here is logged only; the predecessor stays completed.
    /// Returns whether the successor was stored.
    fn spawn_successor(&mut self, task: &Task) -> bool {
        let deadline = next_deadline(task.deadline, task.recurring, &self.tz);
        let row = TaskDraft::successor_of(task, deadline).to_insert_row(self.user.id, self.next_active_index());
        match self.backend.insert(Table::Tasks, vec![row]) {
            Ok(()) => {
                info!(task = %task.id, next = %deadline, "recurring task scheduled");
                true
            }
            Err(e) => {
                error!(task = %task.id, "error creating recurring task: {e}");
                false
            }
        }
    }

    /// Flip `archived` and place the task at the end of its new partition.
    fn move_to_partition(&mut self, id: Uuid, archived: bool) -> Result<()> {
        let tasks = self.store.all();
        let order_index = if archived {
            tasks.iter().map(|t| t.order_index).max().map_or(0, |max| max + 1)
        } else {
            ordering::archive_base(tasks)
        };
        let mut patch = Row::new();
        patch.insert("archived".into(), json!(archived));
        patch.insert("order_index".into(), json!(order_index));
        self.backend.update(Table::Tasks, &patch, &[Filter::eq("id", id)])
    }

    fn archive(&mut self, id: Uuid) -> Result<&'static str> {
        self.require_task(id)?;
        self.move_to_partition(id, true)?;
        info!(task = %id, "task archived");
        self.reload()?;
        self.settle_order()?;
        Ok("Task archived successfully!")
    }

    fn unarchive(&mut self, id: Uuid) -> Result<&'static str> {
        self.require_task(id)?;
        self.move_to_partition(id, false)?;
        info!(task = %id, "task restored");
        self.reload()?;
        self.settle_order()?;
        Ok("Task restored successfully!")
    }

    fn delete(&mut self, id: Uuid) -> Result<&'static str> {
        self.require_task(id)?;
        self.backend.delete(Table::Tasks, &[Filter::eq("id", id)])?;
        info!(task = %id, "task deleted");
        self.reload()?;
        self.settle_order()?;
        Ok("Task deleted successfully!")
    }

    /// Persist a drag from `from` to `to` within the displayed partition.
    fn reorder(&mut self, partition: Partition, from: usize, to: usize) -> Result<()> {
        let Some(sequence) = move_item(&self.displayed_ids(partition), from, to) else {
            return Ok(());
        };
        let tasks = self.store.all().to_vec();
        match partition {
            Partition::Active => ordering::reorder_active(self.backend.as_mut(), &tasks, &sequence),
            Partition::Archived => ordering::reorder_archived(self.backend.as_mut(), &tasks, &sequence),
        };
        self.reload()
    }
}
