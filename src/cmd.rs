//! Command implementations for the CLI interface.
//!
//! Each subcommand maps to a `cmd_*` handler. Handlers return errors to
//! `main`, which prints them and picks the exit code.

use chrono::{Duration, Local, NaiveDate, Utc};
use clap::Subcommand;
use clap_complete::{generate, Shell};
use tracing::info;

use crate::auth::{self, require_user, AuthProvider, Registration};
use crate::config::Config;
use crate::controller::{Command, Controller, TaskAction};
use crate::db::*;
use crate::error::{Error, Result};
use crate::fields::*;
use crate::ordering::Partition;
use crate::recurrence::local_day;
use crate::reminder::{build_reminder, check_daily_reminder, DailyReminder};
use crate::store::TaskFilter;
use crate::task::TaskDraft;
use crate::tui::run::run_tui;
use crate::views::{self, CalendarCell, CalendarState, WEEKDAY_LABELS};

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account and sign in.
    Register {
        /// Full name shown on the dashboard.
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Password confirmation; defaults to --password.
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Sign in with email and password.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Sign out.
    Logout,

    /// Show the signed-in user.
    Whoami,

    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Deadline: "YYYY-MM-DD HH:MM", "tomorrow", "fri 09:00", "in 3d". Defaults to now + 1 day.
        #[arg(long)]
        deadline: Option<String>,
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        #[arg(long, value_enum, default_value_t = Category::Personal)]
        category: Category,
        #[arg(long, value_enum, default_value_t = Recurring::None)]
        recurring: Recurring,
    },

    /// Update fields on a task.
    Edit {
        /// Task ID, ID prefix or title.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        /// Remove the description.
        #[arg(long, conflicts_with = "desc")]
        clear_desc: bool,
        #[arg(long)]
        deadline: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long, value_enum)]
        category: Option<Category>,
        #[arg(long, value_enum)]
        recurring: Option<Recurring>,
    },

    /// List active tasks with optional filters.
    List {
        /// Case-insensitive match on title or description.
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum)]
        category: Option<Category>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long, value_enum, default_value_t = StatusFilter::All)]
        status: StatusFilter,
    },

    /// Flip a task between completed and incomplete.
    Toggle {
        /// Task ID, ID prefix or title.
        id: String,
    },

    /// Move a task to the archive.
    Archive {
        /// Task ID, ID prefix or title.
        id: String,
    },

    /// Restore an archived task.
    Unarchive {
        /// Task ID, ID prefix or title.
        id: String,
    },

    /// Delete a task permanently.
    Delete {
        /// Task ID, ID prefix or title.
        id: String,
    },

    /// Move a task to a position (1 = top) in the active or archived order.
    Move {
        /// Task ID, ID prefix or title.
        id: String,
        position: usize,
        /// Reorder within the archive.
        #[arg(long)]
        archived: bool,
    },

    /// List archived tasks.
    Archived,

    /// Show a month grid and the agenda of one day.
    Calendar {
        /// Day to show: YYYY-MM-DD. Defaults to today.
        #[arg(long)]
        day: Option<NaiveDate>,
    },

    /// Show counters and the category breakdown.
    Dashboard,

    /// Show today's reminder (once per day unless --force).
    Remind {
        #[arg(long)]
        force: bool,
    },

    /// Launch the interactive UI interface.
    Ui,

    /// Print the effective configuration.
    Config {
        /// Write the defaults to config.toml if it does not exist yet.
        #[arg(long)]
        init: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Run one parsed subcommand against the data directory.
pub fn run(db: &mut Database, command: Commands) -> Result<()> {
    match command {
        Commands::Register { name, email, password, confirm } => {
            cmd_register(db, name, email, password, confirm)
        }
        Commands::Login { email, password } => cmd_login(db, email, password),
        Commands::Logout => cmd_logout(db),
        Commands::Whoami => cmd_whoami(db),
        Commands::Add { title, desc, deadline, priority, category, recurring } => {
            cmd_add(db, title, desc, deadline, priority, category, recurring)
        }
        Commands::Edit { id, title, desc, clear_desc, deadline, priority, category, recurring } => {
            cmd_edit(db, id, title, desc, clear_desc, deadline, priority, category, recurring)
        }
        Commands::List { search, category, priority, status } => {
            let filter = TaskFilter {
                search: search.unwrap_or_default(),
                category,
                priority,
                status,
            };
            cmd_list(db, filter)
        }
        Commands::Toggle { id } => cmd_task_action(db, TaskAction::ToggleComplete, id),
        Commands::Archive { id } => cmd_task_action(db, TaskAction::Archive, id),
        Commands::Unarchive { id } => cmd_task_action(db, TaskAction::Unarchive, id),
        Commands::Delete { id } => cmd_task_action(db, TaskAction::Delete, id),
        Commands::Move { id, position, archived } => cmd_move(db, id, position, archived),
        Commands::Archived => cmd_archived(db),
        Commands::Calendar { day } => cmd_calendar(db, day),
        Commands::Dashboard => cmd_dashboard(db),
        Commands::Remind { force } => cmd_remind(db, force),
        Commands::Ui => run_tui(db),
        Commands::Config { init } => cmd_config(db, init),
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

/// Create an account, its profile row, and sign in.
pub fn cmd_register(
    db: &mut Database,
    name: String,
    email: String,
    password: String,
    confirm: Option<String>,
) -> Result<()> {
    let reg = Registration {
        full_name: name,
        email,
        confirm_password: confirm.unwrap_or_else(|| password.clone()),
        password,
    };
    let mut backend = db.backend();
    let user = auth::register(&mut db.auth, &mut backend, &reg, db.config.min_password_len)?;
    println!("Registered and signed in as {}", user.email);
    Ok(())
}

pub fn cmd_login(db: &mut Database, email: String, password: String) -> Result<()> {
    let user = db.auth.sign_in_with_password(&email, &password)?;
    let name = auth::display_name(&db.backend(), &user);
    println!("Welcome back, {name}!");
    Ok(())
}

pub fn cmd_logout(db: &mut Database) -> Result<()> {
    db.auth.sign_out()?;
    println!("Signed out.");
    Ok(())
}

pub fn cmd_whoami(db: &Database) -> Result<()> {
    let user = require_user(&db.auth)?;
    let name = auth::display_name(&db.backend(), &user);
    println!("{name} <{}>", user.email);
    Ok(())
}

fn parse_deadline(input: &str) -> Result<chrono::DateTime<Utc>> {
    parse_deadline_input(input, Utc::now(), &Local)
        .ok_or_else(|| Error::Validation(format!("Could not understand deadline '{input}'")))
}

/// Run a command and print its success message.
fn execute(controller: &mut Controller<Local>, command: Command) -> Result<()> {
    if let Some(message) = controller.execute(command)? {
        println!("{message}");
    }
    Ok(())
}

/// Add a new task for the signed-in user.
pub fn cmd_add(
    db: &Database,
    title: String,
    desc: Option<String>,
    deadline: Option<String>,
    priority: Priority,
    category: Category,
    recurring: Recurring,
) -> Result<()> {
    let mut controller = db.controller()?;
    let deadline = match deadline {
        Some(input) => parse_deadline(&input)?,
        None => Utc::now() + Duration::days(1),
    };
    let draft = TaskDraft {
        description: desc,
        priority,
        category,
        recurring,
        ..TaskDraft::new(title, deadline)
    };
    execute(&mut controller, Command::Create(draft))
}

/// Update fields on an existing task; unspecified fields keep their values.
#[allow(clippy::too_many_arguments)]
pub fn cmd_edit(
    db: &Database,
    id: String,
    title: Option<String>,
    desc: Option<String>,
    clear_desc: bool,
    deadline: Option<String>,
    priority: Option<Priority>,
    category: Option<Category>,
    recurring: Option<Recurring>,
) -> Result<()> {
    let mut controller = db.controller()?;
    let task_id = controller.store().resolve(&id)?;
    let Some(task) = controller.store().get(task_id) else {
        return Err(Error::NotFound(format!("task with ID {task_id}")));
    };

    let mut draft = TaskDraft::from_task(task);
    if let Some(title) = title {
        draft.title = title;
    }
    if clear_desc {
        draft.description = None;
    } else if desc.is_some() {
        draft.description = desc;
    }
    if let Some(input) = deadline {
        draft.deadline = parse_deadline(&input)?;
    }
    draft.priority = priority.unwrap_or(draft.priority);
    draft.category = category.unwrap_or(draft.category);
    draft.recurring = recurring.unwrap_or(draft.recurring);

    execute(&mut controller, Command::Edit(task_id, draft))
}

/// List active tasks passing the filter, in stored order.
pub fn cmd_list(db: &Database, filter: TaskFilter) -> Result<()> {
    let mut controller = db.controller()?;
    controller.filter = filter;
    let view = views::list_view(&controller.filtered(), Utc::now(), &Local);
    print_cards(&view);
    Ok(())
}

/// Toggle, archive, unarchive or delete a task.
pub fn cmd_task_action(db: &Database, action: TaskAction, id: String) -> Result<()> {
    let mut controller = db.controller()?;
    let task_id = controller.store().resolve(&id)?;
    execute(&mut controller, Command::Task(action, task_id))
}

/// Move a task within its ordering partition.
pub fn cmd_move(db: &Database, id: String, position: usize, archived: bool) -> Result<()> {
    let mut controller = db.controller()?;
    let task_id = controller.store().resolve(&id)?;
    let partition = if archived { Partition::Archived } else { Partition::Active };
    let ids = controller.displayed_ids(partition);

    let Some(from) = ids.iter().position(|i| *i == task_id) else {
        let which = if archived { "archived" } else { "active" };
        return Err(Error::Validation(format!("Task is not in the {which} list")));
    };
    if position == 0 || position > ids.len() {
        return Err(Error::Validation(format!(
            "Position must be between 1 and {}",
            ids.len()
        )));
    }

    execute(&mut controller, Command::Reorder { partition, from, to: position - 1 })?;
    info!(task = %task_id, position, "task moved");
    println!("Moved to position {position}.");
    Ok(())
}

pub fn cmd_archived(db: &Database) -> Result<()> {
    let controller = db.controller()?;
    print_cards(&views::archive_view(controller.tasks(), Utc::now(), &Local));
    Ok(())
}

/// Print the month containing `day` and that day's agenda.
pub fn cmd_calendar(db: &Database, day: Option<NaiveDate>) -> Result<()> {
    let controller = db.controller()?;
    let now = Utc::now();
    let today = local_day(&now, &Local);
    let mut state = CalendarState::new(today);
    if let Some(day) = day {
        state.move_selection((day - today).num_days());
    }

    let month = views::calendar_month(controller.tasks(), &state, today, &Local);
    println!("{:^41}", month.title);
    println!("{}", WEEKDAY_LABELS.map(|l| format!("{l:^5}")).join(" "));
    for week in month.weeks() {
        let row: Vec<String> = week.iter().map(calendar_cell).collect();
        println!("{}", row.join(" "));
    }
    println!();

    let agenda = views::day_agenda(controller.tasks(), state.selected_day, now, &Local);
    println!("{}", agenda.date.format("%A, %B %-d, %Y"));
    print_cards(&agenda.view);
    Ok(())
}

fn calendar_cell(cell: &CalendarCell) -> String {
    match cell {
        CalendarCell::Outside(day) => format!(" {day:>2}  "),
        CalendarCell::Day(d) => {
            let (open, close) = if d.is_selected {
                ('[', ']')
            } else if d.is_today {
                ('(', ')')
            } else {
                (' ', ' ')
            };
            let mark = if d.has_tasks { '*' } else { ' ' };
            format!("{open}{:>2}{close}{mark}", d.date.format("%-d"))
        }
    }
}

pub fn cmd_dashboard(db: &Database) -> Result<()> {
    let controller = db.controller()?;
    let name = auth::display_name(controller.backend(), controller.user());
    let stats = views::dashboard(controller.tasks(), Utc::now(), &Local);

    println!("Welcome back, {name}!");
    println!();
    println!("{:<12} {}", "Completed", stats.completed);
    println!("{:<12} {}", "Pending", stats.pending);
    println!("{:<12} {}", "Overdue", stats.overdue);
    println!("{:<12} {}", "Due today", stats.due_today);
    if !stats.by_category.is_empty() {
        println!();
        println!("{:<10} {}", "Category", "Count");
        for (category, count) in &stats.by_category {
            println!("{:<10} {:<4} {}", category.label(), count, "#".repeat(*count));
        }
    }
    Ok(())
}

/// Print today's reminder if it has not been shown yet today.
pub fn cmd_remind(db: &Database, force: bool) -> Result<()> {
    let controller = db.controller()?;
    let now = Utc::now();
    let reminder = if force {
        Some(build_reminder(controller.tasks(), now, &Local))
    } else {
        let mut storage = db.local_storage();
        check_daily_reminder(&mut storage, controller.tasks(), now, &Local)
    };
    match reminder {
        Some(reminder) => print_reminder(&reminder),
        None => println!("Reminder already shown today."),
    }
    Ok(())
}

fn print_reminder(reminder: &DailyReminder) {
    println!("{}", reminder.headline());
    for item in &reminder.items {
        println!("  {} {:<40} {}", item.time, truncate(&item.title, 40), item.priority.label());
    }
}

pub fn cmd_config(db: &Database, init: bool) -> Result<()> {
    let path = Config::path(&db.paths.data_dir);
    if init && !path.exists() {
        db.config.save(&db.paths.data_dir)?;
        println!("Wrote {}", path.display());
    }
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(&db.config)?);
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}
