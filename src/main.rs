//! # td - Personal Task Manager
//!
//! A command-line task manager with an optional terminal user interface (TUI).
//!
//! ## Key Features
//!
//! - **Accounts**: Register and sign in; every task belongs to its owner
//! - **Rich Tasks**: Deadline, priority, category and daily/weekly/monthly recurrence
//! - **Four Views**: Dashboard, filtered task list, month calendar with day agenda, archive
//! - **Manual Ordering**: Active and archived tasks each keep their own order
//! - **Daily Reminder**: Tasks due today, shown once per calendar day
//!
//! ## Quick Start
//!
//! ```bash
//! td register --name "Ada" --email ada@example.com --password secret1
//! td add "Water the plants" --deadline "tomorrow 08:00" --recurring daily
//! td list
//! td ui
//! ```
//!
//! Completing a recurring task schedules its next occurrence automatically.
//! Data is stored locally in `~/.taskdeck/` (override with `--data-dir` or
//! `TASKDECK_DIR`); the log is written to `taskdeck.log` in the same place.

use std::fs::OpenOptions;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod auth;
pub mod backend;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod fields;
pub mod ordering;
pub mod recurrence;
pub mod reminder;
pub mod store;
pub mod task;
pub mod views;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
    pub mod utils;
}

use cli::Cli;
use config::Paths;
use db::Database;

/// Send tracing output to the log file so terminal output stays clean.
fn init_logging(db: &Database) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&db.config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(db.paths.log_file())
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file: {e}");
            return;
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    let paths = Paths::resolve(cli.data_dir);

    let mut db = match Database::open(paths) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    };
    init_logging(&db);

    if let Err(e) = cmd::run(&mut db, cli.command) {
        tracing::error!("command failed: {e}");
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
