//! Date arithmetic for deadlines and recurring tasks.
//!
//! Everything here is pure: callers pass the timezone that defines a
//! calendar day and, where relevant, the reference instant. Calendar days
//! are always taken in that timezone, never in UTC, so "today" matches
//! what the user sees on their clock.
//!
//! Monthly recurrence keeps the day-of-month of the original deadline and
//! clamps it to the last day of shorter months. Every occurrence is derived
//! from the original deadline, not from the previous occurrence, so a task
//! due on the 31st lands on Feb 29, Mar 31, Apr 30 and so on.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::fields::Recurring;
use crate::task::Task;

/// Calendar day of `instant` as seen in `tz`.
pub fn local_day<Tz: TimeZone>(instant: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Number of days in the given month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// Add whole calendar months, clamping the day to the end of the target month.
pub fn add_months_clamped(date: NaiveDate, months: u32) -> NaiveDate {
    let total = date.year() * 12 + date.month0() as i32 + months as i32;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MAX)
}

/// Whether `date` is reached from `origin` by a whole number of recurrence steps.
///
/// `origin` itself counts as step zero. Non-recurring tasks never match here;
/// their only occurrence is the deadline day.
pub fn is_recurring_occurrence(origin: NaiveDate, recurring: Recurring, date: NaiveDate) -> bool {
    if date < origin {
        return false;
    }
    match recurring {
        Recurring::None => false,
        Recurring::Daily => true,
        Recurring::Weekly => (date - origin).num_days() % 7 == 0,
        Recurring::Monthly => {
            let months = (date.year() - origin.year()) * 12 + date.month() as i32
                - origin.month() as i32;
            months >= 0 && add_months_clamped(origin, months as u32) == date
        }
    }
}

/// Whether the task is due on `date`, either by its stored deadline or by
/// a recurrence-implied occurrence.
pub fn is_occurrence_on_date<Tz: TimeZone>(task: &Task, date: NaiveDate, tz: &Tz) -> bool {
    let origin = local_day(&task.deadline, tz);
    origin == date || is_recurring_occurrence(origin, task.recurring, date)
}

/// An occurrence implied by recurrence with no stored row for that day.
pub fn is_virtual_occurrence<Tz: TimeZone>(task: &Task, date: NaiveDate, tz: &Tz) -> bool {
    let origin = local_day(&task.deadline, tz);
    origin != date && is_recurring_occurrence(origin, task.recurring, date)
}

/// Deadline of the successor spawned when a recurring task is completed.
///
/// Steps are applied to the local wall-clock time, so a 09:00 deadline stays
/// at 09:00 across DST changes. A non-recurring deadline is returned as is.
pub fn next_deadline<Tz: TimeZone>(
    deadline: DateTime<Utc>,
    recurring: Recurring,
    tz: &Tz,
) -> DateTime<Utc> {
    let local = deadline.with_timezone(tz).naive_local();
    let next: NaiveDateTime = match recurring {
        Recurring::None => return deadline,
        Recurring::Daily => local + Duration::days(1),
        Recurring::Weekly => local + Duration::days(7),
        Recurring::Monthly => add_months_clamped(local.date(), 1).and_time(local.time()),
    };
    match tz.from_local_datetime(&next).earliest() {
        Some(t) => t.with_timezone(&Utc),
        // Wall-clock time falls in a DST gap.
        None => deadline + (next - local),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Category, Priority};
    use chrono::FixedOffset;
    use uuid::Uuid;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task_due(deadline: DateTime<Utc>, recurring: Recurring) -> Task {
        Task {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "t".into(),
            description: None,
            deadline,
            priority: Priority::Medium,
            category: Category::Work,
            recurring,
            completed: false,
            archived: false,
            order_index: 0,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn daily_occurs_on_every_day_from_deadline() {
        let t = task_due(Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap(), Recurring::Daily);
        assert!(!is_occurrence_on_date(&t, day(2024, 1, 9), &Utc));
        for offset in 0..60 {
            assert!(is_occurrence_on_date(&t, day(2024, 1, 10) + Duration::days(offset), &Utc));
        }
    }

    #[test]
    fn weekly_occurs_every_seventh_day() {
        let t = task_due(Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap(), Recurring::Weekly);
        for offset in 0..50 {
            let d = day(2024, 1, 10) + Duration::days(offset);
            assert_eq!(is_occurrence_on_date(&t, d, &Utc), offset % 7 == 0, "offset {offset}");
        }
        assert!(!is_occurrence_on_date(&t, day(2024, 1, 3), &Utc));
    }

    #[test]
    fn monthly_on_31st_clamps_to_month_end() {
        let t = task_due(Utc.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap(), Recurring::Monthly);
        assert!(is_occurrence_on_date(&t, day(2024, 2, 29), &Utc));
        assert!(is_occurrence_on_date(&t, day(2024, 3, 31), &Utc));
        assert!(is_occurrence_on_date(&t, day(2024, 4, 30), &Utc));
        assert!(!is_occurrence_on_date(&t, day(2024, 4, 29), &Utc));
        assert!(!is_occurrence_on_date(&t, day(2024, 3, 30), &Utc));
        assert!(is_occurrence_on_date(&t, day(2025, 2, 28), &Utc));
    }

    #[test]
    fn non_recurring_only_on_deadline_day() {
        let t = task_due(Utc.with_ymd_and_hms(2024, 5, 5, 23, 59, 0).unwrap(), Recurring::None);
        assert!(is_occurrence_on_date(&t, day(2024, 5, 5), &Utc));
        assert!(!is_occurrence_on_date(&t, day(2024, 5, 6), &Utc));
        assert!(!is_virtual_occurrence(&t, day(2024, 5, 5), &Utc));
    }

    #[test]
    fn calendar_day_follows_the_given_timezone() {
        // 23:30 UTC on Jan 1 is already Jan 2 at UTC+2.
        let t = task_due(Utc.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap(), Recurring::None);
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert!(is_occurrence_on_date(&t, day(2024, 1, 2), &plus_two));
        assert!(!is_occurrence_on_date(&t, day(2024, 1, 1), &plus_two));
        assert!(is_occurrence_on_date(&t, day(2024, 1, 1), &Utc));
    }

    #[test]
    fn virtual_occurrences_exclude_the_stored_day() {
        let t = task_due(Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap(), Recurring::Weekly);
        assert!(!is_virtual_occurrence(&t, day(2024, 1, 10), &Utc));
        assert!(is_virtual_occurrence(&t, day(2024, 1, 17), &Utc));
    }

    #[test]
    fn next_deadline_steps() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        assert_eq!(
            next_deadline(base, Recurring::Daily, &Utc),
            Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap()
        );
        assert_eq!(
            next_deadline(base, Recurring::Weekly, &Utc),
            Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap()
        );
        assert_eq!(next_deadline(base, Recurring::None, &Utc), base);
    }

    #[test]
    fn next_deadline_monthly_clamps_instead_of_overflowing() {
        let jan31 = Utc.with_ymd_and_hms(2023, 1, 31, 18, 15, 0).unwrap();
        assert_eq!(
            next_deadline(jan31, Recurring::Monthly, &Utc),
            Utc.with_ymd_and_hms(2023, 2, 28, 18, 15, 0).unwrap()
        );
        let dec31 = Utc.with_ymd_and_hms(2024, 12, 31, 8, 0, 0).unwrap();
        assert_eq!(
            next_deadline(dec31, Recurring::Monthly, &Utc),
            Utc.with_ymd_and_hms(2025, 1, 31, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn month_helpers() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 12), 31);
        assert_eq!(add_months_clamped(day(2024, 10, 31), 4), day(2025, 2, 28));
    }
}
