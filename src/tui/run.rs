//! TUI entry point and terminal setup.

use std::io;

use chrono::{Local, Utc};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};
use tracing::info;

use crate::auth::{self, AuthProvider};
use crate::db::Database;
use crate::error::Result;
use crate::reminder::check_daily_reminder;
use crate::tui::app::App;

/// Initialise and run the terminal user interface for the signed-in user.
pub fn run_tui(db: &mut Database) -> Result<()> {
    let controller = db.controller()?;
    let display_name = auth::display_name(controller.backend(), controller.user());
    let reminder = if db.config.reminder_on_start {
        let mut storage = db.local_storage();
        check_daily_reminder(&mut storage, controller.tasks(), Utc::now(), &Local)
    } else {
        None
    };
    info!(user = %controller.user().id, "starting TUI");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(controller, display_name, reminder);
    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result?;

    if app.logout_requested() {
        db.auth.sign_out()?;
        info!("signed out from TUI");
        println!("Signed out.");
    }
    Ok(())
}
