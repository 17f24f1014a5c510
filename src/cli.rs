use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;
use crate::config::DATA_DIR_ENV;

/// Personal task manager with recurring tasks, calendar and dashboard.
/// Data lives in ~/.taskdeck unless --data-dir or TASKDECK_DIR says otherwise.
#[derive(Parser)]
#[command(name = "td", version, about = "Personal task manager")]
pub struct Cli {
    /// Directory holding tasks, accounts and configuration.
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
