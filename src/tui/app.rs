//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which holds the TUI state on top of
//! the [`Controller`], handles key presses, renders the four views (dashboard,
//! tasks, calendar, archive) and coordinates forms, confirmations and popups.

use std::io;
use std::time::Duration;

use chrono::{Datelike, Local, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use uuid::Uuid;

use crate::controller::{Command, Controller, Notification, NoticeKind, TaskAction};
use crate::db::{badges, format_due_relative, truncate};
use crate::fields::*;
use crate::ordering::Partition;
use crate::recurrence::local_day;
use crate::reminder::{build_reminder, DailyReminder};
use crate::views::{self, CalendarCell, CalendarState, EmptyState, ListView, TaskCard, WEEKDAY_LABELS};
use crate::tui::{
    colors::{priority_color, text_on, DARK_GREEN, DARK_PURPLE, DARK_RED, GOLD},
    enums::{AppState, PendingAction},
    task_form::{
        TaskForm, CATEGORY_FIELD, DEADLINE_FIELD, DESCRIPTION_FIELD, PRIORITY_FIELD, RECURRING_FIELD,
        TITLE_FIELD,
    },
    utils::centered_rect,
};

/// Main application state for the terminal user interface.
pub struct App {
    state: AppState,
    controller: Controller<Local>,
    display_name: String,
    task_list_state: TableState,
    archive_state: TableState,
    task_form: TaskForm,
    editing: Option<Uuid>,
    pending: Option<PendingAction>,
    reminder: Option<DailyReminder>,
    notification: Option<Notification>,
    status_message: String,
    filter_active: bool,
    logout_requested: bool,
}

impl App {
    /// Create the app; a reminder, if given, is shown first.
    pub fn new(controller: Controller<Local>, display_name: String, reminder: Option<DailyReminder>) -> Self {
        let task_form = TaskForm::new(Utc::now(), controller.tz());
        let mut app = App {
            state: if reminder.is_some() { AppState::Reminder } else { AppState::Main },
            controller,
            display_name,
            task_list_state: TableState::default(),
            archive_state: TableState::default(),
            task_form,
            editing: None,
            pending: None,
            reminder,
            notification: None,
            status_message: String::new(),
            filter_active: false,
            logout_requested: false,
        };
        app.sync_selection();
        app
    }

    /// Whether the user quit with the logout key.
    pub fn logout_requested(&self) -> bool {
        self.logout_requested
    }

    fn notify(&mut self, notification: Option<Notification>) {
        if notification.is_some() {
            self.notification = notification;
        }
        self.sync_selection();
    }

    /// Keep table selections inside their lists after the snapshot changed.
    fn sync_selection(&mut self) {
        let active = self.controller.filtered().len();
        let archived = self.controller.store().archived().len();
        for (state, len) in [(&mut self.task_list_state, active), (&mut self.archive_state, archived)] {
            let selected = match (state.selected(), len) {
                (_, 0) => None,
                (None, _) => Some(0),
                (Some(i), len) => Some(i.min(len - 1)),
            };
            state.select(selected);
        }
    }

    fn selected_task_id(&self) -> Option<Uuid> {
        match self.controller.view {
            View::Tasks => self
                .task_list_state
                .selected()
                .and_then(|i| self.controller.filtered().get(i).map(|t| t.id)),
            View::Archive => self
                .archive_state
                .selected()
                .and_then(|i| self.controller.store().archived().get(i).map(|t| t.id)),
            _ => None,
        }
    }

    fn selected_title(&self, id: Uuid) -> String {
        self.controller
            .store()
            .get(id)
            .map(|t| t.title.clone())
            .unwrap_or_default()
    }

    fn refresh(&mut self) {
        if let Err(e) = self.controller.reload() {
            tracing::error!("error loading tasks: {e}");
            self.notification = Some(Notification::error(format!("Error loading tasks: {e}")));
        } else {
            self.status_message = "Refreshed".to_string();
        }
        self.sync_selection();
    }

    fn open_add_form(&mut self) {
        self.task_form = TaskForm::new(Utc::now(), self.controller.tz());
        self.editing = None;
        self.state = AppState::AddTask;
    }

    fn open_edit_form(&mut self, id: Uuid) {
        if let Some(task) = self.controller.store().get(id) {
            self.task_form = TaskForm::from_task(task, self.controller.tz());
            self.editing = Some(id);
            self.state = AppState::EditTask;
        }
    }

    fn run_action(&mut self, action: TaskAction, id: Uuid) {
        let note = self.controller.dispatch(Command::Task(action, id));
        self.notify(note);
    }

    /// Move the selected row one step up or down in its ordering.
    fn move_selected(&mut self, up: bool) {
        let partition = match self.controller.view {
            View::Tasks => Partition::Active,
            View::Archive => Partition::Archived,
            _ => return,
        };
        let state = match partition {
            Partition::Active => &self.task_list_state,
            Partition::Archived => &self.archive_state,
        };
        let Some(from) = state.selected() else {
            return;
        };
        let len = self.controller.displayed_ids(partition).len();
        let to = if up {
            from.checked_sub(1)
        } else {
            (from + 1 < len).then_some(from + 1)
        };
        let Some(to) = to else {
            return;
        };

        let note = self.controller.dispatch(Command::Reorder { partition, from, to });
        let failed = note.as_ref().is_some_and(Notification::is_error);
        self.notify(note);
        if !failed {
            match partition {
                Partition::Active => self.task_list_state.select(Some(to)),
                Partition::Archived => self.archive_state.select(Some(to)),
            }
        }
    }

    fn submit_form(&mut self) {
        let draft = match self.task_form.to_draft(Utc::now(), self.controller.tz()) {
            Ok(draft) => draft,
            Err(e) => {
                self.notification = Some(Notification::error(e.to_string()));
                return;
            }
        };
        let command = match self.editing {
            Some(id) => Command::Edit(id, draft),
            None => Command::Create(draft),
        };
        let note = self.controller.dispatch(command);
        let failed = note.as_ref().is_some_and(Notification::is_error);
        self.notify(note);
        if !failed {
            self.state = AppState::Main;
            self.editing = None;
        }
    }

    /// Handle one key press; returns true if the application should quit.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        self.status_message.clear();
        if self.state != AppState::AddTask && self.state != AppState::EditTask {
            self.notification = None;
        }
        if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        match self.state {
            AppState::Main => self.handle_main_input(key, modifiers),
            AppState::AddTask | AppState::EditTask => {
                self.handle_form_input(key);
                false
            }
            AppState::Confirm => {
                self.handle_confirm_input(key);
                false
            }
            AppState::Reminder | AppState::Help => {
                self.state = AppState::Main;
                false
            }
        }
    }

    fn handle_search_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.filter_active = false;
                self.controller.filter.search.clear();
            }
            KeyCode::Enter => {
                self.filter_active = false;
                self.status_message = format!(
                    "Filter applied: '{}' ({} tasks)",
                    self.controller.filter.search,
                    self.controller.filtered().len()
                );
            }
            KeyCode::Backspace => {
                self.controller.filter.search.pop();
            }
            KeyCode::Char(c) => self.controller.filter.search.push(c),
            _ => {}
        }
        self.sync_selection();
    }

    fn handle_main_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        if self.filter_active {
            self.handle_search_input(key);
            return false;
        }

        match key {
            KeyCode::Char('q') => return true,
            KeyCode::Char(c @ '1'..='4') => {
                let idx = c as usize - '1' as usize;
                self.controller.view = View::ALL[idx];
            }
            KeyCode::Tab => self.controller.view = cycle(&View::ALL, self.controller.view, true),
            KeyCode::BackTab => self.controller.view = cycle(&View::ALL, self.controller.view, false),
            KeyCode::Char('h') | KeyCode::F(1) => self.state = AppState::Help,
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('R') => {
                self.reminder = Some(build_reminder(self.controller.tasks(), Utc::now(), self.controller.tz()));
                self.state = AppState::Reminder;
            }
            KeyCode::Char('L') => {
                self.logout_requested = true;
                return true;
            }
            KeyCode::Char('a') => self.open_add_form(),
            _ => match self.controller.view {
                View::Dashboard => {}
                View::Tasks => self.handle_tasks_input(key, modifiers),
                View::Calendar => self.handle_calendar_input(key),
                View::Archive => self.handle_archive_input(key),
            },
        }
        false
    }

    fn select_step(state: &mut TableState, len: usize, down: bool) {
        if len == 0 {
            state.select(None);
            return;
        }
        let next = match (state.selected(), down) {
            (None, _) => 0,
            (Some(i), true) => (i + 1).min(len - 1),
            (Some(i), false) => i.saturating_sub(1),
        };
        state.select(Some(next));
    }

    fn handle_tasks_input(&mut self, key: KeyCode, _modifiers: KeyModifiers) {
        let len = self.controller.filtered().len();
        match key {
            KeyCode::Up | KeyCode::Char('k') => Self::select_step(&mut self.task_list_state, len, false),
            KeyCode::Down | KeyCode::Char('j') => Self::select_step(&mut self.task_list_state, len, true),
            KeyCode::Char('K') => self.move_selected(true),
            KeyCode::Char('J') => self.move_selected(false),
            KeyCode::Char('/') => self.filter_active = true,
            KeyCode::Char('c') => {
                self.controller.filter.category = cycle_optional(&Category::ALL, self.controller.filter.category);
                self.sync_selection();
            }
            KeyCode::Char('p') => {
                self.controller.filter.priority = cycle_optional(&Priority::ALL, self.controller.filter.priority);
                self.sync_selection();
            }
            KeyCode::Char('s') => {
                self.controller.filter.status = self.controller.filter.status.next();
                self.sync_selection();
            }
            KeyCode::Esc => {
                self.controller.filter = Default::default();
                self.sync_selection();
            }
            _ => {
                let Some(id) = self.selected_task_id() else {
                    return;
                };
                match key {
                    KeyCode::Char('e') | KeyCode::Enter => self.open_edit_form(id),
                    KeyCode::Char(' ') => self.run_action(TaskAction::ToggleComplete, id),
                    KeyCode::Char('x') => {
                        self.pending = Some(PendingAction::Archive { id, title: self.selected_title(id) });
                        self.state = AppState::Confirm;
                    }
                    KeyCode::Char('d') => {
                        self.pending = Some(PendingAction::Delete { id, title: self.selected_title(id) });
                        self.state = AppState::Confirm;
                    }
                    _ => {}
                }
            }
        }
    }

    fn handle_archive_input(&mut self, key: KeyCode) {
        let len = self.controller.store().archived().len();
        match key {
            KeyCode::Up | KeyCode::Char('k') => Self::select_step(&mut self.archive_state, len, false),
            KeyCode::Down | KeyCode::Char('j') => Self::select_step(&mut self.archive_state, len, true),
            KeyCode::Char('K') => self.move_selected(true),
            KeyCode::Char('J') => self.move_selected(false),
            KeyCode::Char('u') => {
                if let Some(id) = self.selected_task_id() {
                    self.run_action(TaskAction::Unarchive, id);
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_task_id() {
                    self.pending = Some(PendingAction::Delete { id, title: self.selected_title(id) });
                    self.state = AppState::Confirm;
                }
            }
            _ => {}
        }
    }

    fn handle_calendar_input(&mut self, key: KeyCode) {
        let calendar = &mut self.controller.calendar;
        match key {
            KeyCode::Left => calendar.move_selection(-1),
            KeyCode::Right => calendar.move_selection(1),
            KeyCode::Up => calendar.move_selection(-7),
            KeyCode::Down => calendar.move_selection(7),
            KeyCode::Char('<') | KeyCode::Char(',') => calendar.prev_month(),
            KeyCode::Char('>') | KeyCode::Char('.') => calendar.next_month(),
            KeyCode::Char('t') => {
                *calendar = CalendarState::new(local_day(&Utc::now(), &Local));
            }
            _ => {}
        }
    }

    fn handle_form_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.state = AppState::Main;
                self.editing = None;
            }
            KeyCode::Tab | KeyCode::Down => self.task_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.task_form.prev_field(),
            KeyCode::Left => self.task_form.handle_left_right(false),
            KeyCode::Right => self.task_form.handle_left_right(true),
            KeyCode::Backspace => self.task_form.handle_backspace(),
            KeyCode::Delete => self.task_form.handle_delete(),
            KeyCode::Enter => self.submit_form(),
            KeyCode::Char(c) => self.task_form.handle_char(c),
            _ => {}
        }
    }

    fn handle_confirm_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                match self.pending.take() {
                    Some(PendingAction::Archive { id, .. }) => self.run_action(TaskAction::Archive, id),
                    Some(PendingAction::Delete { id, .. }) => self.run_action(TaskAction::Delete, id),
                    None => {}
                }
                self.state = AppState::Main;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.pending = None;
                self.state = AppState::Main;
            }
            _ => {}
        }
    }

    /// Poll for and handle keyboard events.
    ///
    /// Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key.code, key.modifiers));
                }
            }
        }
        Ok(false)
    }

    /// Header with the welcome line and the view tabs.
    fn render_header(&self, f: &mut Frame, area: Rect) {
        let mut tabs = vec![
            Span::styled("TASKDECK", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
        ];
        for (i, view) in View::ALL.iter().enumerate() {
            let style = if *view == self.controller.view {
                Style::default().bg(GOLD).fg(text_on(GOLD)).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            tabs.push(Span::styled(format!(" {} {} ", i + 1, view.label()), style));
            tabs.push(Span::raw(" "));
        }
        let header = Paragraph::new(vec![
            Line::from(tabs),
            Line::from(Span::styled(
                format!("Welcome back, {}!", self.display_name),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            )),
        ])
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_empty(f: &mut Frame, area: Rect, empty: &EmptyState, title: &str) {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(empty.title, Style::default().add_modifier(Modifier::BOLD))),
            Line::from(Span::styled(empty.hint.clone(), Style::default().fg(Color::DarkGray))),
        ];
        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
    }

    fn render_dashboard(&self, f: &mut Frame, area: Rect) {
        let stats = views::dashboard(self.controller.tasks(), Utc::now(), self.controller.tz());
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0)])
            .split(area);

        let counters = [
            ("Completed", stats.completed, DARK_GREEN),
            ("Pending", stats.pending, GOLD),
            ("Overdue", stats.overdue, DARK_RED),
            ("Due today", stats.due_today, DARK_PURPLE),
        ];
        let boxes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(25); 4])
            .split(chunks[0]);
        for ((label, value, color), rect) in counters.into_iter().zip(boxes.iter()) {
            let counter = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(value.to_string(), Style::default().add_modifier(Modifier::BOLD))),
            ])
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(label)
                    .border_style(Style::default().fg(color)),
            );
            f.render_widget(counter, *rect);
        }

        if stats.by_category.is_empty() {
            Self::render_empty(f, chunks[1], &EmptyState::task_list(), "Tasks by category");
            return;
        }
        let max = stats.by_category.iter().map(|(_, n)| *n).max().unwrap_or(1).max(1);
        let bar_width = chunks[1].width.saturating_sub(24) as usize;
        let rows: Vec<Row> = stats
            .by_category
            .iter()
            .map(|(category, count)| {
                let bar = "█".repeat((count * bar_width).div_ceil(max));
                Row::new(vec![
                    Cell::from(category.label()),
                    Cell::from(count.to_string()),
                    Cell::from(Span::styled(bar, Style::default().fg(Color::Cyan))),
                ])
            })
            .collect();
        let table = Table::new(rows, [Constraint::Length(10), Constraint::Length(5), Constraint::Min(1)])
            .block(Block::default().borders(Borders::ALL).title("Tasks by category"));
        f.render_widget(table, chunks[1]);
    }

    fn card_row<'a>(&self, card: &TaskCard) -> Row<'a> {
        let today = local_day(&Utc::now(), self.controller.tz());
        let due = self
            .controller
            .store()
            .get(card.id)
            .map(|t| format_due_relative(local_day(&t.deadline, self.controller.tz()), today))
            .unwrap_or_default();
        let style = if card.completed {
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
        } else if card.overdue {
            Style::default().fg(Color::LightRed)
        } else {
            Style::default().fg(Color::White)
        };
        let title = match &card.description {
            Some(desc) => format!("{} - {}", card.title, truncate(desc, 40)),
            None => card.title.clone(),
        };
        Row::new(vec![
            Cell::from(if card.completed { "[x]" } else { "[ ]" }),
            Cell::from(format!("{title}{}", badges(card))),
            Cell::from(card.deadline_text.clone()),
            Cell::from(if card.overdue { format!("{due} !") } else { due }),
            Cell::from(Span::styled(card.priority.label(), Style::default().fg(priority_color(card.priority)))),
            Cell::from(card.category.label()),
        ])
        .style(style)
    }

    fn card_table<'a>(&self, cards: &[TaskCard], title: String) -> Table<'a> {
        let header = Row::new(
            ["", "Title", "Deadline", "Due", "Priority", "Category"]
                .map(|h| Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))),
        )
        .style(Style::default().bg(Color::Blue).fg(Color::White));
        let widths = [
            Constraint::Length(4),
            Constraint::Min(25),
            Constraint::Length(19),
            Constraint::Length(11),
            Constraint::Length(8),
            Constraint::Length(9),
        ];
        Table::new(cards.iter().map(|c| self.card_row(c)).collect::<Vec<_>>(), widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ")
    }

    fn filter_summary(&self) -> String {
        let filter = &self.controller.filter;
        if filter.is_default() {
            return "No filters  (/ search, c category, p priority, s status)".to_string();
        }
        format!(
            "Search: {}  Category: {}  Priority: {}  Status: {}",
            if filter.search.is_empty() { "-" } else { filter.search.as_str() },
            filter.category.map_or("All", Category::label),
            filter.priority.map_or("All", Priority::label),
            filter.status.label(),
        )
    }

    fn render_tasks(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);
        let summary = Paragraph::new(self.filter_summary()).style(Style::default().fg(Color::Cyan));
        f.render_widget(summary, chunks[0]);

        let view = views::list_view(&self.controller.filtered(), Utc::now(), self.controller.tz());
        match view {
            ListView::Empty(empty) => Self::render_empty(f, chunks[1], &empty, "Tasks"),
            ListView::Cards(cards) => {
                let title = format!("Tasks ({}) - Press 'h' for help", cards.len());
                let table = self.card_table(&cards, title);
                f.render_stateful_widget(table, chunks[1], &mut self.task_list_state);
            }
        }
    }

    fn render_archive(&mut self, f: &mut Frame, area: Rect) {
        match views::archive_view(self.controller.tasks(), Utc::now(), self.controller.tz()) {
            ListView::Empty(empty) => Self::render_empty(f, area, &empty, "Archive"),
            ListView::Cards(cards) => {
                let title = format!("Archive ({}) - u restore, d delete", cards.len());
                let table = self.card_table(&cards, title);
                f.render_stateful_widget(table, area, &mut self.archive_state);
            }
        }
    }

    fn render_calendar(&self, f: &mut Frame, area: Rect) {
        let tz = self.controller.tz();
        let now = Utc::now();
        let today = local_day(&now, tz);
        let state = &self.controller.calendar;
        let month = views::calendar_month(self.controller.tasks(), state, today, tz);

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(45), Constraint::Min(0)])
            .split(area);

        let header = Row::new(WEEKDAY_LABELS.map(|l| Cell::from(l).style(Style::default().add_modifier(Modifier::BOLD))));
        let rows: Vec<Row> = month
            .weeks()
            .map(|week| {
                Row::new(week.iter().map(|cell| match cell {
                    CalendarCell::Outside(day) => {
                        Cell::from(format!("{day:>3}")).style(Style::default().fg(Color::DarkGray))
                    }
                    CalendarCell::Day(d) => {
                        let mark = if d.has_tasks { "•" } else { " " };
                        let mut style = Style::default();
                        if d.is_today {
                            style = style.fg(GOLD).add_modifier(Modifier::BOLD);
                        }
                        if d.is_selected {
                            style = style.bg(Color::Gray).fg(Color::Black);
                        }
                        Cell::from(format!("{:>3}{mark}", d.date.day())).style(style)
                    }
                }))
                .height(2)
            })
            .collect();
        let grid = Table::new(rows, [Constraint::Length(5); 7]).header(header).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{}  (< > month, t today)", month.title)),
        );
        f.render_widget(grid, chunks[0]);

        let agenda = views::day_agenda(self.controller.tasks(), state.selected_day, now, tz);
        let title = agenda.date.format("%A, %b %-d").to_string();
        match &agenda.view {
            ListView::Empty(empty) => Self::render_empty(f, chunks[1], empty, &title),
            ListView::Cards(cards) => {
                let lines: Vec<Line> = cards
                    .iter()
                    .map(|card| {
                        let style = if card.completed {
                            Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
                        } else {
                            Style::default()
                        };
                        Line::from(vec![
                            Span::styled(format!("{:<8}", card.priority.label()), Style::default().fg(priority_color(card.priority))),
                            Span::styled(format!("{}{}", card.title, badges(card)), style),
                            Span::styled(format!("  {}", card.category.label()), Style::default().fg(Color::DarkGray)),
                        ])
                    })
                    .collect();
                let list = Paragraph::new(lines)
                    .block(Block::default().borders(Borders::ALL).title(title))
                    .wrap(Wrap { trim: true });
                f.render_widget(list, chunks[1]);
            }
        }
    }

    fn render_task_form(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(5), // Description
                Constraint::Length(3), // Deadline
                Constraint::Length(3), // Priority
                Constraint::Length(3), // Category
                Constraint::Length(3), // Recurring
                Constraint::Min(1),    // Instructions
            ])
            .split(area);

        let form = &self.task_form;
        let border = |field: usize| {
            if form.current_field == field {
                Style::default().fg(GOLD)
            } else {
                Style::default()
            }
        };
        let text_field = |value: &str, title: &'static str, field: usize| {
            Paragraph::new(value.to_string())
                .block(Block::default().borders(Borders::ALL).title(title).border_style(border(field)))
                .wrap(Wrap { trim: false })
        };
        let selector = |value: &str, title: &'static str, field: usize| {
            Paragraph::new(format!("< {value} >"))
                .block(Block::default().borders(Borders::ALL).title(title).border_style(border(field)))
        };

        f.render_widget(text_field(&form.title.value, "Title *", TITLE_FIELD), chunks[0]);
        f.render_widget(text_field(&form.description.value, "Description", DESCRIPTION_FIELD), chunks[1]);
        f.render_widget(
            text_field(&form.deadline.value, "Deadline (YYYY-MM-DD HH:MM, tomorrow, fri 09:00)", DEADLINE_FIELD),
            chunks[2],
        );
        f.render_widget(selector(form.priority.label(), "Priority", PRIORITY_FIELD), chunks[3]);
        f.render_widget(selector(form.category.label(), "Category", CATEGORY_FIELD), chunks[4]);
        f.render_widget(selector(form.recurring.label(), "Repeat", RECURRING_FIELD), chunks[5]);

        let heading = if self.state == AppState::EditTask { "Edit Task" } else { "Add New Task" };
        let instructions = Paragraph::new(format!(
            "{heading}: Tab/Up/Down move between fields  Left/Right change selectors  Enter save  Esc cancel"
        ))
        .block(Block::default().borders(Borders::ALL).title("Instructions"))
        .wrap(Wrap { trim: true });
        f.render_widget(instructions, chunks[6]);

        let input = match form.current_field {
            TITLE_FIELD => Some((&form.title, chunks[0])),
            DESCRIPTION_FIELD => Some((&form.description, chunks[1])),
            DEADLINE_FIELD => Some((&form.deadline, chunks[2])),
            _ => None,
        };
        if let Some((field, rect)) = input {
            let x = rect.x + 1 + (field.cursor as u16).min(rect.width.saturating_sub(3));
            f.set_cursor_position((x, rect.y + 1));
        }
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(Span::styled("Global:", bold)),
            Line::from("  1-4, Tab     Switch view (Dashboard, Tasks, Calendar, Archive)"),
            Line::from("  a            Add new task"),
            Line::from("  r            Refresh from storage"),
            Line::from("  R            Show today's reminder"),
            Line::from("  L            Log out and quit"),
            Line::from("  h/F1         Show this help"),
            Line::from("  q/Ctrl+C     Quit"),
            Line::from(""),
            Line::from(Span::styled("Tasks:", bold)),
            Line::from("  Up/Down, k/j Select task"),
            Line::from("  K/J          Move task up/down"),
            Line::from("  e/Enter      Edit task"),
            Line::from("  Space        Toggle completion"),
            Line::from("  x            Archive task"),
            Line::from("  d            Delete task"),
            Line::from("  /            Search title and description"),
            Line::from("  c, p, s      Cycle category, priority, status filters"),
            Line::from("  Esc          Clear filters"),
            Line::from(""),
            Line::from(Span::styled("Calendar:", bold)),
            Line::from("  Arrows       Move selected day"),
            Line::from("  < >          Previous/next month"),
            Line::from("  t            Jump to today"),
            Line::from(""),
            Line::from(Span::styled("Archive:", bold)),
            Line::from("  u            Restore task"),
            Line::from("  d            Delete task"),
            Line::from("  K/J          Move task up/down"),
        ];
        let paragraph = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL).title("Help - Press any key to return"))
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    /// Render a confirmation dialog for archive and delete.
    fn render_confirm(&self, f: &mut Frame, area: Rect) {
        let Some(pending) = &self.pending else {
            return;
        };
        let area = centered_rect(50, 30, area);
        f.render_widget(Clear, area);

        let mut text = vec![
            Line::from(""),
            Line::from(Span::styled(pending.prompt(), Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
        ];
        if !pending.is_reversible() {
            text.push(Line::from("This action cannot be undone."));
            text.push(Line::from(""));
        }
        text.push(Line::from("Press 'y' to confirm, 'n' to cancel"));

        let paragraph = Paragraph::new(text)
            .block(
                Block::default()
                    .title("Confirm Action")
                    .borders(Borders::ALL)
                    .style(Style::default().bg(DARK_RED)),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_reminder(&self, f: &mut Frame, area: Rect) {
        let Some(reminder) = &self.reminder else {
            return;
        };
        let area = centered_rect(60, 50, area);
        f.render_widget(Clear, area);

        let mut text = vec![
            Line::from(""),
            Line::from(Span::styled(reminder.headline(), Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
        ];
        for item in &reminder.items {
            text.push(Line::from(vec![
                Span::raw(format!("{}  ", item.time)),
                Span::raw(truncate(&item.title, 40)),
                Span::styled(format!("  {}", item.priority.label()), Style::default().fg(priority_color(item.priority))),
            ]));
        }
        text.push(Line::from(""));
        text.push(Line::from("Press any key to continue"));

        let paragraph = Paragraph::new(text)
            .block(
                Block::default()
                    .title(format!("Daily Reminder - {}", reminder.date.format("%A, %b %-d")))
                    .borders(Borders::ALL)
                    .style(Style::default().bg(DARK_PURPLE).fg(Color::White)),
            )
            .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
    }

    /// Render the status bar at the bottom of the screen.
    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let (text, bg) = if let Some(note) = &self.notification {
            let bg = match note.kind {
                NoticeKind::Success => DARK_GREEN,
                NoticeKind::Error => DARK_RED,
            };
            (note.message.clone(), bg)
        } else if !self.status_message.is_empty() {
            (self.status_message.clone(), Color::Blue)
        } else if self.filter_active {
            (
                format!("Search: {} (Esc to clear, Enter to confirm)", self.controller.filter.search),
                Color::Blue,
            )
        } else {
            let hint = match self.state {
                AppState::Main => match self.controller.view {
                    View::Dashboard => "a add | 1-4 views | R reminder | h help | q quit",
                    View::Tasks => "Space done | e edit | x archive | d delete | K/J move | / search | h help",
                    View::Calendar => "Arrows day | < > month | t today | h help",
                    View::Archive => "u restore | d delete | K/J move | h help",
                },
                AppState::AddTask => "Add New Task",
                AppState::EditTask => "Edit Task",
                AppState::Confirm => "Confirm Action",
                AppState::Reminder => "Daily Reminder",
                AppState::Help => "Help",
            };
            (hint.to_string(), Color::Blue)
        };
        let status = Paragraph::new(text)
            .style(Style::default().bg(bg).fg(text_on(bg)))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Main render function that dispatches to appropriate view renderers.
    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        self.render_header(f, chunks[0]);
        match self.state {
            AppState::AddTask | AppState::EditTask => self.render_task_form(f, chunks[1]),
            AppState::Help => self.render_help(f, chunks[1]),
            _ => match self.controller.view {
                View::Dashboard => self.render_dashboard(f, chunks[1]),
                View::Tasks => self.render_tasks(f, chunks[1]),
                View::Calendar => self.render_calendar(f, chunks[1]),
                View::Archive => self.render_archive(f, chunks[1]),
            },
        }
        match self.state {
            AppState::Confirm => self.render_confirm(f, chunks[1]),
            AppState::Reminder => self.render_reminder(f, chunks[1]),
            _ => {}
        }
        self.render_status_bar(f, chunks[2]);
    }

    /// Main event loop for the TUI application.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::User;
    use crate::backend::JsonBackend;
    use ratatui::backend::TestBackend;

    fn app() -> App {
        let user = User { id: Uuid::new_v4(), email: "me@example.com".into() };
        let mut controller = Controller::new(Box::new(JsonBackend::in_memory()), user, Local, Utc::now());
        controller.reload().unwrap();
        App::new(controller, "Ada".into(), None)
    }

    fn press(app: &mut App, key: KeyCode) -> bool {
        app.handle_key(key, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn add_task(app: &mut App, title: &str) {
        press(app, KeyCode::Char('a'));
        type_text(app, title);
        press(app, KeyCode::Enter);
    }

    #[test]
    fn form_creates_a_task() {
        let mut app = app();
        add_task(&mut app, "Buy milk");
        assert_eq!(app.state, AppState::Main);
        assert_eq!(app.controller.tasks().len(), 1);
        assert_eq!(app.controller.tasks()[0].title, "Buy milk");
        assert_eq!(app.notification, Some(Notification::success("Task created successfully!")));
    }

    #[test]
    fn empty_title_keeps_the_form_open() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::AddTask);
        assert_eq!(app.notification, Some(Notification::error("Task title is required")));
        assert!(app.controller.tasks().is_empty());
    }

    #[test]
    fn archive_waits_for_confirmation() {
        let mut app = app();
        add_task(&mut app, "Old stuff");
        press(&mut app, KeyCode::Char('2'));

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.state, AppState::Confirm);
        press(&mut app, KeyCode::Char('n'));
        assert!(app.controller.store().archived().is_empty());

        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.controller.store().archived().len(), 1);
        assert_eq!(app.task_list_state.selected(), None);
    }

    #[test]
    fn shift_k_moves_selection_up() {
        let mut app = app();
        add_task(&mut app, "First");
        add_task(&mut app, "Second");
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('K'));

        let titles: Vec<_> = app.controller.filtered().iter().map(|t| t.title.clone()).collect();
        assert_eq!(titles, ["Second", "First"]);
        assert_eq!(app.task_list_state.selected(), Some(0));
    }

    #[test]
    fn search_filters_as_you_type() {
        let mut app = app();
        add_task(&mut app, "Groceries");
        add_task(&mut app, "Gym");
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "gro");
        assert_eq!(app.controller.filtered().len(), 1);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.controller.filtered().len(), 2);
    }

    #[test]
    fn filter_summary_lists_active_filters() {
        let mut app = app();
        press(&mut app, KeyCode::Char('2'));
        assert!(app.filter_summary().starts_with("No filters"));
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.filter_summary(), "Search: -  Category: All  Priority: Low  Status: All");
        press(&mut app, KeyCode::Esc);
        assert!(app.filter_summary().starts_with("No filters"));
    }

    #[test]
    fn reminder_popup_closes_on_any_key() {
        let user = User { id: Uuid::new_v4(), email: "me@example.com".into() };
        let controller = Controller::new(Box::new(JsonBackend::in_memory()), user, Local, Utc::now());
        let reminder = build_reminder(&[], Utc::now(), &Local);
        let mut app = App::new(controller, "Ada".into(), Some(reminder));
        assert_eq!(app.state, AppState::Reminder);
        assert!(!press(&mut app, KeyCode::Char('x')));
        assert_eq!(app.state, AppState::Main);
    }

    #[test]
    fn logout_key_quits() {
        let mut app = app();
        assert!(press(&mut app, KeyCode::Char('L')));
        assert!(app.logout_requested());
    }

    #[test]
    fn every_view_renders() {
        let mut app = app();
        add_task(&mut app, "Render me");
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        for key in ['1', '2', '3', '4'] {
            press(&mut app, KeyCode::Char(key));
            terminal.draw(|f| app.render(f)).unwrap();
        }
        press(&mut app, KeyCode::Char('h'));
        terminal.draw(|f| app.render(f)).unwrap();
    }
}
