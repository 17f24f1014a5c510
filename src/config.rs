//! Configuration loading and management
//!
//! Handles the data directory and the optional `config.toml` inside it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fields::View;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "TASKDECK_DIR";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Tracing filter used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Screen the TUI opens on
    #[serde(default)]
    pub default_view: View,

    /// Run the daily reminder check when the TUI starts
    #[serde(default = "default_true")]
    pub reminder_on_start: bool,

    /// Minimum password length accepted at registration
    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            default_view: View::default(),
            reminder_on_start: true,
            min_password_len: default_min_password_len(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_min_password_len() -> usize {
    6
}

impl Config {
    /// Load `config.toml` from the data directory; a missing file yields defaults.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = Self::path(data_dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Write the configuration back to the data directory.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        fs::write(Self::path(data_dir), toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join("config.toml")
    }
}

/// Resolved locations of everything the application stores.
#[derive(Debug, Clone)]
pub struct Paths {
    pub data_dir: PathBuf,
}

impl Paths {
    /// Pick the data directory: explicit flag, then environment, then `$HOME/.taskdeck`.
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        let data_dir = explicit
            .or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".taskdeck")
            });
        Self { data_dir }
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    pub fn backend(&self) -> PathBuf {
        self.data_dir.join("backend.json")
    }

    pub fn local_storage(&self) -> PathBuf {
        self.data_dir.join("local_storage.json")
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("taskdeck.log")
    }
}
