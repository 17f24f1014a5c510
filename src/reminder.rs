//! Once-per-day "due today" reminder and the client-local key/value store
//! that remembers when it was last shown.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing::{info, warn};

use crate::error::Result;
use crate::fields::Priority;
use crate::recurrence::local_day;
use crate::task::Task;
use crate::views::format_time;

/// Key holding the calendar day the reminder was last shown.
pub const LAST_REMINDER_KEY: &str = "lastLogin";

/// Small persistent string map, local to this device.
#[derive(Debug, Default)]
pub struct LocalStorage {
    path: Option<PathBuf>,
    values: BTreeMap<String, String>,
}

impl LocalStorage {
    /// Open the store at `path`; a missing or unreadable file starts empty.
    pub fn open(path: &Path) -> Self {
        let values = fs::read_to_string(path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self { path: Some(path.to_path_buf()), values }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        if let Some(path) = &self.path {
            fs::write(path, serde_json::to_string_pretty(&self.values)?)?;
        }
        Ok(())
    }
}

/// Calendar day as stored under [`LAST_REMINDER_KEY`], e.g. "Mon Jan 01 2024".
pub fn day_key(day: NaiveDate) -> String {
    day.format("%a %b %d %Y").to_string()
}

/// A task listed in the reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderItem {
    pub title: String,
    pub priority: Priority,
    pub time: String,
}

/// Content of the daily reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyReminder {
    pub date: NaiveDate,
    pub items: Vec<ReminderItem>,
}

impl DailyReminder {
    pub fn headline(&self) -> String {
        match self.items.len() {
            0 => "No tasks due today!".into(),
            1 => "You have 1 task due today:".into(),
            n => format!("You have {n} tasks due today:"),
        }
    }
}

/// Incomplete, non-archived tasks whose deadline falls on `today`.
pub fn due_today<'a, Tz: TimeZone>(tasks: &'a [Task], today: NaiveDate, tz: &Tz) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| !t.completed && !t.archived && local_day(&t.deadline, tz) == today)
        .collect()
}

/// Build today's reminder regardless of whether it was shown already.
pub fn build_reminder<Tz: TimeZone>(tasks: &[Task], now: DateTime<Utc>, tz: &Tz) -> DailyReminder
where
    Tz::Offset: std::fmt::Display,
{
    let today = local_day(&now, tz);
    let items = due_today(tasks, today, tz)
        .into_iter()
        .map(|t| ReminderItem {
            title: t.title.clone(),
            priority: t.priority,
            time: format_time(&t.deadline, tz),
        })
        .collect();
    DailyReminder { date: today, items }
}

/// Show the reminder at most once per calendar day on this device.
///
/// Returns `None` when today's reminder was already shown; otherwise records
/// today and returns the reminder (possibly with no items).
pub fn check_daily_reminder<Tz: TimeZone>(
    storage: &mut LocalStorage,
    tasks: &[Task],
    now: DateTime<Utc>,
    tz: &Tz,
) -> Option<DailyReminder>
where
    Tz::Offset: std::fmt::Display,
{
    let today = day_key(local_day(&now, tz));
    if storage.get(LAST_REMINDER_KEY) == Some(today.as_str()) {
        return None;
    }
    if let Err(e) = storage.set(LAST_REMINDER_KEY, &today) {
        warn!("could not record reminder date: {e}");
    }
    let reminder = build_reminder(tasks, now, tz);
    info!(due = reminder.items.len(), "daily reminder shown");
    Some(reminder)
}
