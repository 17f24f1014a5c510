//! Enumerations for TUI state management.

use uuid::Uuid;

/// Application state for the terminal user interface.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AppState {
    /// One of the four views, chosen by the controller's current view.
    Main,
    AddTask,
    EditTask,
    Confirm,
    Reminder,
    Help,
}

/// An action waiting for a yes/no answer.
#[derive(Clone, PartialEq, Debug)]
pub enum PendingAction {
    Archive { id: Uuid, title: String },
    Delete { id: Uuid, title: String },
}

impl PendingAction {
    pub fn prompt(&self) -> String {
        match self {
            PendingAction::Archive { title, .. } => format!("Archive '{title}'?"),
            PendingAction::Delete { title, .. } => format!("Delete '{title}' permanently?"),
        }
    }

    /// Whether the action can be undone from the archive view.
    pub fn is_reversible(&self) -> bool {
        matches!(self, PendingAction::Archive { .. })
    }
}
