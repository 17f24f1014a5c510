//! Display structures for the four views.
//!
//! These functions project the task snapshot into plain data (cards,
//! calendar cells, counters) that both the CLI printer and the TUI draw.
//! They never filter archived tasks back in: the archive view is the only
//! place archived tasks appear.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

use crate::fields::*;
use crate::recurrence::{days_in_month, is_occurrence_on_date, is_virtual_occurrence, local_day};
use crate::task::Task;

/// Placeholder shown instead of an empty container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    pub title: &'static str,
    pub hint: String,
}

impl EmptyState {
    pub fn task_list() -> Self {
        Self {
            title: "No tasks found",
            hint: "Create your first task to get started!".into(),
        }
    }

    pub fn archive() -> Self {
        Self {
            title: "No archived tasks",
            hint: "Completed tasks you archive will appear here.".into(),
        }
    }

    pub fn day(date: NaiveDate) -> Self {
        Self {
            title: "No tasks",
            hint: format!("No tasks scheduled for {}", date.format("%A, %b %-d")),
        }
    }
}

/// One rendered task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskCard {
    pub id: uuid::Uuid,
    pub title: String,
    pub description: Option<String>,
    pub deadline_text: String,
    pub overdue: bool,
    pub category: Category,
    pub priority: Priority,
    pub recurring: Recurring,
    pub completed: bool,
    pub archived: bool,
    /// Recurrence-implied occurrence without a stored row for the shown day.
    pub virtual_occurrence: bool,
}

impl TaskCard {
    pub fn new<Tz: TimeZone>(task: &Task, now: DateTime<Utc>, tz: &Tz) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone().filter(|d| !d.is_empty()),
            deadline_text: format_deadline(&task.deadline, tz),
            overdue: task.is_overdue(now),
            category: task.category,
            priority: task.priority,
            recurring: task.recurring,
            completed: task.completed,
            archived: task.archived,
            virtual_occurrence: false,
        }
    }
}

/// Deadline as shown on cards, e.g. "Jan 1, 2024 09:00".
pub fn format_deadline<Tz: TimeZone>(deadline: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    deadline.with_timezone(tz).format("%b %-d, %Y %H:%M").to_string()
}

/// Wall-clock time of a deadline, e.g. "09:00".
pub fn format_time<Tz: TimeZone>(deadline: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    deadline.with_timezone(tz).format("%H:%M").to_string()
}

/// Either cards or the view's empty state.
#[derive(Debug, Clone, PartialEq)]
pub enum ListView {
    Empty(EmptyState),
    Cards(Vec<TaskCard>),
}

impl ListView {
    pub fn cards(&self) -> &[TaskCard] {
        match self {
            ListView::Empty(_) => &[],
            ListView::Cards(cards) => cards,
        }
    }
}

/// The task list: the filtered, non-archived sequence in stored order.
pub fn list_view<Tz: TimeZone>(filtered: &[&Task], now: DateTime<Utc>, tz: &Tz) -> ListView
where
    Tz::Offset: std::fmt::Display,
{
    let cards: Vec<TaskCard> = filtered
        .iter()
        .filter(|t| !t.archived)
        .map(|t| TaskCard::new(t, now, tz))
        .collect();
    if cards.is_empty() {
        ListView::Empty(EmptyState::task_list())
    } else {
        ListView::Cards(cards)
    }
}

/// Archived tasks ordered by their offset `order_index`.
pub fn archive_view<Tz: TimeZone>(tasks: &[Task], now: DateTime<Utc>, tz: &Tz) -> ListView
where
    Tz::Offset: std::fmt::Display,
{
    let mut archived: Vec<&Task> = tasks.iter().filter(|t| t.archived).collect();
    archived.sort_by_key(|t| t.order_index);
    if archived.is_empty() {
        return ListView::Empty(EmptyState::archive());
    }
    ListView::Cards(archived.into_iter().map(|t| TaskCard::new(t, now, tz)).collect())
}

/// Displayed month and selected day of the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarState {
    /// First day of the displayed month.
    pub displayed_month: NaiveDate,
    pub selected_day: NaiveDate,
}

impl CalendarState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            displayed_month: today.with_day(1).unwrap_or(today),
            selected_day: today,
        }
    }

    pub fn prev_month(&mut self) {
        self.displayed_month = self
            .displayed_month
            .checked_sub_months(chrono::Months::new(1))
            .unwrap_or(self.displayed_month);
    }

    pub fn next_month(&mut self) {
        self.displayed_month = self
            .displayed_month
            .checked_add_months(chrono::Months::new(1))
            .unwrap_or(self.displayed_month);
    }

    /// Move the selection by `days`, following it into neighbouring months.
    pub fn move_selection(&mut self, days: i64) {
        self.selected_day += Duration::days(days);
        self.displayed_month = self.selected_day.with_day(1).unwrap_or(self.selected_day);
    }

    pub fn select(&mut self, date: NaiveDate) {
        self.selected_day = date;
    }
}

/// A day of the displayed month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub is_today: bool,
    pub is_selected: bool,
    pub has_tasks: bool,
}

/// A grid cell: a padding day from a neighbouring month, or a real day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarCell {
    Outside(u32),
    Day(DayCell),
}

/// Month grid, weeks starting on Sunday.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarMonth {
    pub title: String,
    pub cells: Vec<CalendarCell>,
}

impl CalendarMonth {
    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarCell]> {
        self.cells.chunks(7)
    }

    pub fn days(&self) -> impl Iterator<Item = &DayCell> {
        self.cells.iter().filter_map(|c| match c {
            CalendarCell::Day(d) => Some(d),
            CalendarCell::Outside(_) => None,
        })
    }
}

pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Build the grid for `state.displayed_month`, flagging days with occurrences.
pub fn calendar_month<Tz: TimeZone>(
    tasks: &[Task],
    state: &CalendarState,
    today: NaiveDate,
    tz: &Tz,
) -> CalendarMonth {
    let first = state.displayed_month;
    let (year, month) = (first.year(), first.month());
    let days = days_in_month(year, month);
    let leading = first.weekday().num_days_from_sunday();
    let prev_last = first.pred_opt().map_or(31, |d| d.day());

    let mut cells = Vec::with_capacity(42);
    for i in (0..leading).rev() {
        cells.push(CalendarCell::Outside(prev_last - i));
    }
    for day in 1..=days {
        let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
            continue;
        };
        let has_tasks = tasks
            .iter()
            .any(|t| !t.archived && is_occurrence_on_date(t, date, tz));
        cells.push(CalendarCell::Day(DayCell {
            date,
            is_today: date == today,
            is_selected: date == state.selected_day,
            has_tasks,
        }));
    }
    let trailing = (7 - cells.len() % 7) % 7;
    for day in 1..=trailing as u32 {
        cells.push(CalendarCell::Outside(day));
    }

    CalendarMonth {
        title: first.format("%B %Y").to_string(),
        cells,
    }
}

/// Occurrences on one day, real or recurrence-implied.
#[derive(Debug, Clone, PartialEq)]
pub struct DayAgenda {
    pub date: NaiveDate,
    pub view: ListView,
}

pub fn day_agenda<Tz: TimeZone>(tasks: &[Task], date: NaiveDate, now: DateTime<Utc>, tz: &Tz) -> DayAgenda
where
    Tz::Offset: std::fmt::Display,
{
    let cards: Vec<TaskCard> = tasks
        .iter()
        .filter(|t| !t.archived && is_occurrence_on_date(t, date, tz))
        .map(|t| TaskCard {
            virtual_occurrence: is_virtual_occurrence(t, date, tz),
            ..TaskCard::new(t, now, tz)
        })
        .collect();
    let view = if cards.is_empty() {
        ListView::Empty(EmptyState::day(date))
    } else {
        ListView::Cards(cards)
    };
    DayAgenda { date, view }
}

/// Counters and category histogram of the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
    pub due_today: usize,
    /// Categories present among active tasks, in first-seen order.
    pub by_category: Vec<(Category, usize)>,
}

pub fn dashboard<Tz: TimeZone>(tasks: &[Task], now: DateTime<Utc>, tz: &Tz) -> DashboardStats {
    let today = local_day(&now, tz);
    let mut stats = DashboardStats::default();
    for task in tasks.iter().filter(|t| !t.archived) {
        if task.completed {
            stats.completed += 1;
        } else {
            stats.pending += 1;
            if task.deadline < now {
                stats.overdue += 1;
            }
            if local_day(&task.deadline, tz) == today {
                stats.due_today += 1;
            }
        }
        match stats.by_category.iter_mut().find(|(c, _)| *c == task.category) {
            Some((_, n)) => *n += 1,
            None => stats.by_category.push((task.category, 1)),
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{due, task};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_states_differ_between_list_and_archive() {
        let now = at(2024, 1, 1, 12);
        assert_eq!(list_view(&[], now, &Utc), ListView::Empty(EmptyState::task_list()));
        assert_eq!(archive_view(&[], now, &Utc), ListView::Empty(EmptyState::archive()));
        assert_ne!(EmptyState::task_list(), EmptyState::archive());
    }

    #[test]
    fn cards_flag_overdue_and_format_deadline() {
        let now = at(2024, 1, 2, 12);
        let t = due("late", at(2024, 1, 1, 9));
        let ListView::Cards(cards) = list_view(&[&t], now, &Utc) else {
            panic!("expected cards");
        };
        assert!(cards[0].overdue);
        assert_eq!(cards[0].deadline_text, "Jan 1, 2024 09:00");

        let mut done = t.clone();
        done.completed = true;
        assert!(!TaskCard::new(&done, now, &Utc).overdue);
    }

    #[test]
    fn archive_view_sorts_by_order_index() {
        let mut x = task("x", 9);
        x.archived = true;
        let mut y = task("y", 7);
        y.archived = true;
        let active = task("active", 0);
        let view = archive_view(&[x, active, y], at(2024, 1, 1, 0), &Utc);
        let titles: Vec<_> = view.cards().iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["y", "x"]);
    }

    #[test]
    fn dashboard_counts_overdue_until_completed() {
        let now = at(2024, 3, 10, 12);
        let mut t = due("bills", at(2024, 3, 9, 9));
        let stats = dashboard(std::slice::from_ref(&t), now, &Utc);
        assert_eq!((stats.pending, stats.overdue, stats.completed), (1, 1, 0));

        t.completed = true;
        let stats = dashboard(std::slice::from_ref(&t), now, &Utc);
        assert_eq!((stats.pending, stats.overdue, stats.completed), (0, 0, 1));
    }

    #[test]
    fn dashboard_excludes_archived_and_counts_today() {
        let now = at(2024, 3, 10, 8);
        let today_later = due("today", at(2024, 3, 10, 18));
        let mut gone = due("gone", at(2024, 3, 1, 9));
        gone.archived = true;
        let mut health = due("run", at(2024, 3, 12, 7));
        health.category = Category::Health;

        let stats = dashboard(&[today_later, gone, health], now, &Utc);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.overdue, 0);
        assert_eq!(stats.due_today, 1);
        assert_eq!(stats.by_category, vec![(Category::Work, 1), (Category::Health, 1)]);
    }

    #[test]
    fn calendar_grid_pads_to_whole_weeks() {
        // January 2024 starts on a Monday.
        let state = CalendarState::new(date(2024, 1, 15));
        let month = calendar_month(&[], &state, date(2024, 1, 15), &Utc);
        assert_eq!(month.title, "January 2024");
        assert_eq!(month.cells[0], CalendarCell::Outside(31));
        assert_eq!(month.cells.len() % 7, 0);
        assert_eq!(month.days().count(), 31);
        assert_eq!(month.cells.last(), Some(&CalendarCell::Outside(3)));
        let today = month.days().find(|d| d.is_today).unwrap();
        assert_eq!(today.date, date(2024, 1, 15));
        assert!(today.is_selected);
    }

    #[test]
    fn calendar_flags_recurring_days_but_not_archived() {
        let mut weekly = due("standup", at(2024, 1, 3, 9));
        weekly.recurring = Recurring::Weekly;
        let mut archived = due("old", at(2024, 1, 20, 9));
        archived.archived = true;
        let state = CalendarState::new(date(2024, 1, 1));
        let month = calendar_month(&[weekly, archived], &state, date(2024, 1, 1), &Utc);
        let busy: Vec<u32> = month.days().filter(|d| d.has_tasks).map(|d| d.date.day()).collect();
        assert_eq!(busy, vec![3, 10, 17, 24, 31]);
    }

    #[test]
    fn day_agenda_tags_virtual_occurrences() {
        let now = at(2024, 1, 1, 0);
        let mut weekly = due("standup", at(2024, 1, 3, 9));
        weekly.recurring = Recurring::Weekly;
        let once = due("dentist", at(2024, 1, 10, 14));

        let agenda = day_agenda(&[weekly.clone(), once], date(2024, 1, 10), now, &Utc);
        let cards = agenda.view.cards();
        assert_eq!(cards.len(), 2);
        assert!(cards[0].virtual_occurrence);
        assert!(!cards[1].virtual_occurrence);

        let original = day_agenda(&[weekly], date(2024, 1, 3), now, &Utc);
        assert!(!original.view.cards()[0].virtual_occurrence);

        let empty = day_agenda(&[], date(2024, 1, 4), now, &Utc);
        assert_eq!(empty.view, ListView::Empty(EmptyState::day(date(2024, 1, 4))));
    }

    #[test]
    fn calendar_navigation() {
        let mut state = CalendarState::new(date(2024, 1, 31));
        state.next_month();
        assert_eq!(state.displayed_month, date(2024, 2, 1));
        state.prev_month();
        state.prev_month();
        assert_eq!(state.displayed_month, date(2023, 12, 1));
        state.move_selection(1);
        assert_eq!(state.selected_day, date(2024, 2, 1));
        assert_eq!(state.displayed_month, date(2024, 2, 1));
    }
}
