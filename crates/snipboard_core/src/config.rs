//! TOML configuration for hosts embedding the core.
//!
//! # Invariants
//! - Relative paths in a config file resolve against the file's directory.
//! - A missing config file is not an error; `load_config` returns `None`.

use crate::db::{open_db, DbError};
use crate::logging::default_log_level;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_CONFIG_FILE: &str = "snipboard.toml";

/// Config load/write failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error at `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("config already exists at `{}`", .0.display())]
    AlreadyExists(PathBuf),
    #[error(transparent)]
    Db(#[from] DbError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnipboardConfig {
    /// SQLite database file.
    pub database_path: PathBuf,
    /// One of trace|debug|info|warn|error. Defaults per build mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Rolling log directory. File logging stays off when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl SnipboardConfig {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            log_level: None,
            log_dir: None,
        }
    }

    pub fn effective_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }

    /// Creates the database's parent directory if needed and opens it.
    pub fn open_database(&self) -> Result<Connection, ConfigError> {
        ensure_db_dir(&self.database_path)?;
        Ok(open_db(&self.database_path)?)
    }

    fn resolve_against(mut self, base: &Path) -> Self {
        if self.database_path.is_relative() {
            self.database_path = base.join(&self.database_path);
        }
        if let Some(log_dir) = self.log_dir.as_mut() {
            if log_dir.is_relative() {
                *log_dir = base.join(&*log_dir);
            }
        }
        self
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Reads the config at `path`, or `snipboard.toml` in the working directory.
pub fn load_config(path: Option<&Path>) -> Result<Option<SnipboardConfig>, ConfigError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let config: SnipboardConfig = toml::from_str(&contents)?;

    let cwd = if path.is_absolute() {
        PathBuf::new()
    } else {
        std::env::current_dir().map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?
    };
    Ok(Some(config.resolve_against(&config_base_dir(&path, &cwd))))
}

/// Absolute directory holding the config file at `path`.
fn config_base_dir(path: &Path, cwd: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new(""));
    if parent.is_absolute() {
        parent.to_path_buf()
    } else {
        cwd.join(parent)
    }
}

pub fn write_config(path: &Path, config: &SnipboardConfig, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn ensure_db_dir(db_path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}
