//! Task form handling for the terminal user interface.
//!
//! This module provides the `TaskForm` structure used for both creating and
//! editing tasks, including field ordering and conversion to a [`TaskDraft`].

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::db::parse_deadline_input;
use crate::error::{Error, Result};
use crate::fields::{cycle, Category, Priority, Recurring};
use crate::task::{Task, TaskDraft};
use crate::tui::input::InputField;

/// Field order, top to bottom.
pub const TITLE_FIELD: usize = 0;
pub const DESCRIPTION_FIELD: usize = 1;
pub const DEADLINE_FIELD: usize = 2;
pub const PRIORITY_FIELD: usize = 3;
pub const CATEGORY_FIELD: usize = 4;
pub const RECURRING_FIELD: usize = 5;
const FIELD_COUNT: usize = 6;

/// Format used to prefill the deadline field.
pub const DEADLINE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Task form for creating and editing tasks.
#[derive(Debug, Clone)]
pub struct TaskForm {
    pub title: InputField,
    pub description: InputField,
    pub deadline: InputField,
    pub priority: Priority,
    pub category: Category,
    pub recurring: Recurring,
    pub current_field: usize,
}

impl TaskForm {
    /// Blank form; the deadline defaults to this time tomorrow.
    pub fn new<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let tomorrow = (now + Duration::days(1)).with_timezone(tz);
        let mut form = Self {
            title: InputField::new(),
            description: InputField::new(),
            deadline: InputField::with_value(&tomorrow.format(DEADLINE_FORMAT).to_string()),
            priority: Priority::Medium,
            category: Category::Personal,
            recurring: Recurring::None,
            current_field: TITLE_FIELD,
        };
        form.update_active_field();
        form
    }

    /// Form prefilled from an existing task.
    pub fn from_task<Tz: TimeZone>(task: &Task, tz: &Tz) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let mut form = Self {
            title: InputField::with_value(&task.title),
            description: InputField::with_value(task.description.as_deref().unwrap_or_default()),
            deadline: InputField::with_value(&task.deadline.with_timezone(tz).format(DEADLINE_FORMAT).to_string()),
            priority: task.priority,
            category: task.category,
            recurring: task.recurring,
            current_field: TITLE_FIELD,
        };
        form.update_active_field();
        form
    }

    /// The focused text field, if the focus is not on a selector.
    fn active_input(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            TITLE_FIELD => Some(&mut self.title),
            DESCRIPTION_FIELD => Some(&mut self.description),
            DEADLINE_FIELD => Some(&mut self.deadline),
            _ => None,
        }
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_COUNT;
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        self.current_field = (self.current_field + FIELD_COUNT - 1) % FIELD_COUNT;
        self.update_active_field();
    }

    /// Update which field is currently active for editing.
    pub fn update_active_field(&mut self) {
        self.title.active = self.current_field == TITLE_FIELD;
        self.description.active = self.current_field == DESCRIPTION_FIELD;
        self.deadline.active = self.current_field == DEADLINE_FIELD;
    }

    pub fn handle_char(&mut self, c: char) {
        if let Some(field) = self.active_input() {
            field.handle_char(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(field) = self.active_input() {
            field.handle_backspace();
        }
    }

    pub fn handle_delete(&mut self) {
        if let Some(field) = self.active_input() {
            field.handle_delete();
        }
    }

    /// Move the cursor in text fields, or change the value of selectors.
    pub fn handle_left_right(&mut self, right: bool) {
        match self.current_field {
            PRIORITY_FIELD => self.priority = cycle(&Priority::ALL, self.priority, right),
            CATEGORY_FIELD => self.category = cycle(&Category::ALL, self.category, right),
            RECURRING_FIELD => self.recurring = cycle(&Recurring::ALL, self.recurring, right),
            _ => {
                if let Some(field) = self.active_input() {
                    if right {
                        field.move_cursor_right();
                    } else {
                        field.move_cursor_left();
                    }
                }
            }
        }
    }

    /// Build the draft to submit; the title is checked by the controller.
    pub fn to_draft<Tz: TimeZone>(&self, now: DateTime<Utc>, tz: &Tz) -> Result<TaskDraft> {
        let deadline = parse_deadline_input(&self.deadline.value, now, tz)
            .ok_or_else(|| Error::Validation("Please enter a valid deadline".into()))?;
        let description = Some(self.description.value.clone()).filter(|d| !d.trim().is_empty());
        Ok(TaskDraft {
            title: self.title.value.clone(),
            description,
            deadline,
            priority: self.priority,
            category: self.category,
            recurring: self.recurring,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 14, 5, 0).unwrap()
    }

    #[test]
    fn new_form_defaults_to_tomorrow() {
        let form = TaskForm::new(now(), &Utc);
        assert_eq!(form.deadline.value, "2024-03-11 14:05");
        assert!(form.title.active);
        let draft = form.to_draft(now(), &Utc).unwrap();
        assert_eq!(draft.deadline, now() + Duration::days(1));
        assert_eq!(draft.priority, Priority::Medium);
        assert_eq!(draft.category, Category::Personal);
        assert_eq!(draft.recurring, Recurring::None);
    }

    #[test]
    fn selectors_cycle_with_left_right() {
        let mut form = TaskForm::new(now(), &Utc);
        form.current_field = PRIORITY_FIELD;
        form.handle_left_right(true);
        assert_eq!(form.priority, Priority::High);
        form.next_field();
        form.handle_left_right(false);
        assert_eq!(form.category, Category::Work);
        form.next_field();
        form.handle_left_right(true);
        assert_eq!(form.recurring, Recurring::Daily);
        form.next_field();
        assert_eq!(form.current_field, TITLE_FIELD);
    }

    #[test]
    fn typing_goes_to_the_focused_field_only() {
        let mut form = TaskForm::new(now(), &Utc);
        for c in "Call mum".chars() {
            form.handle_char(c);
        }
        form.next_field();
        form.handle_char('x');
        form.current_field = PRIORITY_FIELD;
        form.handle_char('y');
        assert_eq!(form.title.value, "Call mum");
        assert_eq!(form.description.value, "x");
    }

    #[test]
    fn bad_deadline_is_a_validation_error() {
        let mut form = TaskForm::new(now(), &Utc);
        form.deadline = InputField::with_value("whenever");
        assert!(matches!(form.to_draft(now(), &Utc), Err(Error::Validation(_))));
    }

    #[test]
    fn huge_relative_deadline_is_a_validation_error() {
        let mut form = TaskForm::new(now(), &Utc);
        form.deadline = InputField::with_value("in 99999999999d");
        assert!(matches!(form.to_draft(now(), &Utc), Err(Error::Validation(_))));
    }

    #[test]
    fn edit_form_round_trips_the_task() {
        let mut task = crate::store::tests::due("Dentist", now());
        task.description = Some("bring card".into());
        task.recurring = Recurring::Monthly;
        let form = TaskForm::from_task(&task, &Utc);
        let draft = form.to_draft(now(), &Utc).unwrap();
        assert_eq!(draft, TaskDraft::from_task(&task));
    }
}
