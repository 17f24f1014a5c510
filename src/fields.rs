//! Enumerations and field types for task management.
//!
//! This module defines the structured values a task can carry (priority,
//! category, recurrence) plus the filter and view selectors used by the
//! CLI and the TUI.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How important a task is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Life area a task belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Work,
    Personal,
    Study,
    Health,
    Other,
}

/// Recurrence step of a task.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Recurring {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Recurring {
    /// True for every value that actually repeats.
    pub fn repeats(self) -> bool {
        !matches!(self, Recurring::None)
    }
}

/// Status selector of the task filter.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

/// Top-level screens of the application.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    #[default]
    Dashboard,
    Tasks,
    Calendar,
    Archive,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Work,
        Category::Personal,
        Category::Study,
        Category::Health,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Work => "Work",
            Category::Personal => "Personal",
            Category::Study => "Study",
            Category::Health => "Health",
            Category::Other => "Other",
        }
    }
}

impl Recurring {
    pub const ALL: [Recurring; 4] = [
        Recurring::None,
        Recurring::Daily,
        Recurring::Weekly,
        Recurring::Monthly,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Recurring::None => "None",
            Recurring::Daily => "Daily",
            Recurring::Weekly => "Weekly",
            Recurring::Monthly => "Monthly",
        }
    }
}

impl StatusFilter {
    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Active => "Active",
            StatusFilter::Completed => "Completed",
        }
    }

    pub fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Active,
            StatusFilter::Active => StatusFilter::Completed,
            StatusFilter::Completed => StatusFilter::All,
        }
    }
}

impl View {
    pub const ALL: [View; 4] = [View::Dashboard, View::Tasks, View::Calendar, View::Archive];

    pub fn label(self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Tasks => "Tasks",
            View::Calendar => "Calendar",
            View::Archive => "Archive",
        }
    }

    pub fn index(self) -> usize {
        View::ALL.iter().position(|v| *v == self).unwrap_or(0)
    }
}

/// Step to the neighbour of `current` inside `all`, wrapping around.
pub fn cycle<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let len = all.len();
    let idx = all.iter().position(|v| *v == current).unwrap_or(0);
    let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
    all[next]
}

/// Step through `None` followed by every value of `all` (a wildcard selector).
pub fn cycle_optional<T: Copy + PartialEq>(all: &[T], current: Option<T>) -> Option<T> {
    match current {
        None => all.first().copied(),
        Some(v) => {
            let idx = all.iter().position(|x| *x == v).unwrap_or(0);
            all.get(idx + 1).copied()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_names_match_stored_columns() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
        assert_eq!(serde_json::to_string(&Category::Study).unwrap(), "\"study\"");
        assert_eq!(serde_json::to_string(&Recurring::None).unwrap(), "\"none\"");
        let r: Recurring = serde_json::from_str("\"monthly\"").unwrap();
        assert_eq!(r, Recurring::Monthly);
    }

    #[test]
    fn cycling_wraps_and_wildcards() {
        assert_eq!(cycle(&Priority::ALL, Priority::High, true), Priority::Low);
        assert_eq!(cycle(&Priority::ALL, Priority::Low, false), Priority::High);
        assert_eq!(cycle_optional(&Priority::ALL, None), Some(Priority::Low));
        assert_eq!(cycle_optional(&Priority::ALL, Some(Priority::High)), None);
        assert_eq!(StatusFilter::Completed.next(), StatusFilter::All);
    }
}
