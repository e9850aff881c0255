//! Layered configuration: built-in defaults, an optional `sqlstencil.toml`, and
//! `SQLSTENCIL__...` environment variables, in increasing precedence.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::driver::SqliteDriver;
use crate::error::{Result, StencilError};
use crate::session::Session;

pub const DEFAULT_CONFIG_FILE: &str = "sqlstencil.toml";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct DatabaseSettings {
    /// SQLite file; an in-memory database is used when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Delete the database file before opening it.
    #[serde(default)]
    pub recreate_on_startup: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LogSettings {
    #[serde(default = "LogSettings::default_filter")]
    pub filter: String,
}

impl LogSettings {
    fn default_filter() -> String {
        "info".to_string()
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { filter: Self::default_filter() }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub log: LogSettings,
}

impl Settings {
    /// Load from `file` (if it exists) overlaid with the environment.
    pub fn load<P: AsRef<Path>>(file: P) -> Result<Self> {
        let settings = Config::builder()
            .set_default("log.filter", LogSettings::default_filter())?
            .set_default("database.recreate_on_startup", false)?
            .add_source(File::from(file.as_ref()).required(false))
            .add_source(Environment::with_prefix("SQLSTENCIL").separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
    /// Open a session on the configured database.
    pub fn open_session(&self) -> Result<Session<SqliteDriver>> {
        let driver = match &self.database.path {
            Some(path) => {
                if self.database.recreate_on_startup && path.exists() {
                    std::fs::remove_file(path)?;
                }
                SqliteDriver::open(path)
            }
            None => SqliteDriver::open_in_memory(),
        }
        .map_err(|e| StencilError::Connection(e.to_string()))?;
        Ok(Session::new(driver))
    }
}
