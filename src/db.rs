//! Data directory access and utility functions for task management.
//!
//! This module provides the `Database` struct that opens everything stored
//! under the data directory (tables, accounts, local storage), along with
//! helpers for deadline parsing and table printing.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use tracing::debug;

use crate::auth::{require_user, LocalAuth};
use crate::backend::JsonBackend;
use crate::config::{Config, Paths};
use crate::controller::Controller;
use crate::error::Result;
use crate::reminder::LocalStorage;
use crate::store::short_id;
use crate::views::{ListView, TaskCard};

/// Everything the application keeps under one data directory.
#[derive(Debug)]
pub struct Database {
    pub paths: Paths,
    pub config: Config,
    pub auth: LocalAuth,
}

impl Database {
    /// Create the data directory if needed and read its configuration.
    pub fn open(paths: Paths) -> Result<Self> {
        paths.ensure()?;
        let config = Config::load(&paths.data_dir)?;
        let auth = LocalAuth::open(&paths.data_dir);
        Ok(Self { paths, config, auth })
    }

    /// A fresh handle on the task and profile tables.
    pub fn backend(&self) -> JsonBackend {
        JsonBackend::open(&self.paths.backend())
    }

    pub fn local_storage(&self) -> LocalStorage {
        LocalStorage::open(&self.paths.local_storage())
    }

    /// Controller for the signed-in user with the task snapshot loaded.
    pub fn controller(&self) -> Result<Controller<Local>> {
        let user = require_user(&self.auth)?;
        debug!(user = %user.id, "opening session");
        let mut controller = Controller::new(Box::new(self.backend()), user, Local, Utc::now());
        controller.view = self.config.default_view;
        controller.reload()?;
        Ok(controller)
    }
}

/// Parse human-readable deadline input into an instant.
///
/// Supports:
/// - "YYYY-MM-DD HH:MM", "YYYY-MM-DDTHH:MM" and RFC 3339
/// - "today", "tomorrow", "in 3d", "in 2w", "in 5h"
/// - "monday".."sunday" (and "mon".."sun"), "next friday"
/// - "YYYY-MM-DD"
///
/// Day expressions may be followed by a time ("tomorrow 14:30"); without one
/// the current wall-clock time is kept, so "tomorrow" is now plus one day.
pub fn parse_deadline_input<Tz: TimeZone>(s: &str, now: DateTime<Utc>, tz: &Tz) -> Option<DateTime<Utc>> {
    let s = s.trim().to_lowercase();
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M", "%Y-%m-%dt%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&s, fmt) {
            return from_local(naive, tz);
        }
    }

    if let Some(hours) = s.strip_prefix("in ").and_then(|r| r.strip_suffix('h')) {
        return hours
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|delta| now.checked_add_signed(delta));
    }

    let local_now = now.with_timezone(tz).naive_local();
    let (day_part, time) = match s.rsplit_once(' ') {
        Some((day, time)) => match NaiveTime::parse_from_str(time, "%H:%M") {
            Ok(t) => (day.to_string(), t),
            Err(_) => (s.clone(), wall_clock(local_now)),
        },
        None => (s.clone(), wall_clock(local_now)),
    };
    let day = parse_day(&day_part, local_now.date())?;
    from_local(day.and_time(time), tz)
}

fn wall_clock(local: NaiveDateTime) -> NaiveTime {
    let time = local.time();
    time.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(time)
}

fn from_local<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive).earliest().map(|dt| dt.with_timezone(&Utc))
}

/// `None` when the result falls outside the supported calendar.
fn add_days(day: NaiveDate, days: i64) -> Option<NaiveDate> {
    Duration::try_days(days).and_then(|delta| day.checked_add_signed(delta))
}

fn parse_day(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    match s {
        "today" => return Some(today),
        "tomorrow" => return add_days(today, 1),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            return nd.trim().parse::<i64>().ok().and_then(|d| add_days(today, d));
        }
        if let Some(nw) = rest.strip_suffix('w') {
            return nw
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(|w| w.checked_mul(7))
                .and_then(|d| add_days(today, d));
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let current = today.weekday().num_days_from_monday() as i64;
    for (name, target) in weekdays {
        let ahead = (target + 7 - current) % 7;
        if s == name {
            return add_days(today, ahead);
        }
        if s == format!("next {name}") {
            let ahead = if ahead == 0 { 7 } else { ahead };
            return add_days(today, ahead);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Format a deadline day relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: NaiveDate, today: NaiveDate) -> String {
    let days = (due - today).num_days();
    match days {
        0 => "today".into(),
        1 => "tomorrow".into(),
        d if d > 1 => format!("in {d}d"),
        d => format!("{}d late", -d),
    }
}

/// Print cards in a formatted table, or the view's empty state.
pub fn print_cards(view: &ListView) {
    let cards = match view {
        ListView::Empty(empty) => {
            println!("{}", empty.title);
            println!("  {}", empty.hint);
            return;
        }
        ListView::Cards(cards) => cards,
    };
    println!(
        "{:<9} {:<4} {:<7} {:<9} {:<20} {}",
        "ID", "Done", "Pri", "Category", "Deadline", "Title"
    );
    for card in cards {
        println!(
            "{:<9} {:<4} {:<7} {:<9} {:<20} {}{}",
            short_id(card.id),
            if card.completed { "[x]" } else { "[ ]" },
            card.priority.label(),
            card.category.label(),
            deadline_cell(card),
            truncate(&card.title, 48),
            badges(card),
        );
    }
}

fn deadline_cell(card: &TaskCard) -> String {
    if card.overdue {
        format!("{} !", card.deadline_text)
    } else {
        card.deadline_text.clone()
    }
}

/// Trailing markers shown after a card title.
pub fn badges(card: &TaskCard) -> String {
    let mut out = String::new();
    if card.recurring.repeats() {
        out.push_str(&format!(" [{}]", card.recurring.label()));
    }
    if card.virtual_occurrence {
        out.push_str(" (repeat)");
    }
    out
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn now() -> DateTime<Utc> {
        // Wednesday
        Utc.with_ymd_and_hms(2024, 1, 3, 8, 15, 0).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn explicit_date_and_time() {
        assert_eq!(parse_deadline_input("2024-02-10 14:30", now(), &Utc), Some(at(2024, 2, 10, 14, 30)));
        assert_eq!(parse_deadline_input("2024-02-10T14:30", now(), &Utc), Some(at(2024, 2, 10, 14, 30)));
        assert_eq!(
            parse_deadline_input("2024-02-10T14:30:00+02:00", now(), &Utc),
            Some(at(2024, 2, 10, 12, 30))
        );
    }

    #[test]
    fn relative_days_keep_wall_clock() {
        assert_eq!(parse_deadline_input("tomorrow", now(), &Utc), Some(at(2024, 1, 4, 8, 15)));
        assert_eq!(parse_deadline_input("in 3d", now(), &Utc), Some(at(2024, 1, 6, 8, 15)));
        assert_eq!(parse_deadline_input("in 2h", now(), &Utc), Some(at(2024, 1, 3, 10, 15)));
        assert_eq!(parse_deadline_input("today 17:00", now(), &Utc), Some(at(2024, 1, 3, 17, 0)));
    }

    #[test]
    fn weekdays() {
        assert_eq!(parse_deadline_input("fri 09:00", now(), &Utc), Some(at(2024, 1, 5, 9, 0)));
        assert_eq!(parse_deadline_input("wednesday 09:00", now(), &Utc), Some(at(2024, 1, 3, 9, 0)));
        assert_eq!(parse_deadline_input("next wed 09:00", now(), &Utc), Some(at(2024, 1, 10, 9, 0)));
    }

    #[test]
    fn out_of_range_offsets_are_rejected() {
        for input in ["in 99999999999d", "in 9999999999999h", "in 999999999999w", "in 9223372036854775807w"] {
            assert_eq!(parse_deadline_input(input, now(), &Utc), None, "{input}");
        }
        assert_eq!(parse_deadline_input("in -1d", now(), &Utc), Some(at(2024, 1, 2, 8, 15)));
    }

    #[test]
    fn local_time_is_converted() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(parse_deadline_input("2024-02-10 09:00", now(), &plus_two), Some(at(2024, 2, 10, 7, 0)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_deadline_input("someday", now(), &Utc), None);
        assert_eq!(parse_deadline_input("2024-13-01", now(), &Utc), None);
    }

    #[test]
    fn relative_due_text() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(format_due_relative(today, today), "today");
        assert_eq!(format_due_relative(today + Duration::days(1), today), "tomorrow");
        assert_eq!(format_due_relative(today + Duration::days(4), today), "in 4d");
        assert_eq!(format_due_relative(today - Duration::days(2), today), "2d late");
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
