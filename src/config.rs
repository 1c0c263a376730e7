//! Configuration management for termshell.
//!
//! Loads `config.toml` from the platform config directory. Every field has a
//! default, so a missing file or a partial file is fine.

use crate::error::{Result, ShellError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Prompt shown by the interactive REPL.
    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// State bucket storage.
    #[serde(default)]
    pub state: StateConfig,

    /// Filesystem plugin used by `>>`.
    #[serde(default)]
    pub filesystem: FilesystemConfig,

    /// Logging.
    #[serde(default)]
    pub log: LogConfig,
}

fn default_prompt() -> String {
    "$ ".to_string()
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            state: StateConfig::default(),
            filesystem: FilesystemConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Where state buckets are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// JSON file holding every bucket. Defaults to the platform state file.
    pub path: Option<PathBuf>,

    /// When false, buckets live in memory and `persist()` goes nowhere.
    #[serde(default = "default_true")]
    pub persist: bool,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: None,
            persist: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Filesystem plugin settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesystemConfig {
    /// Directory mapped to `/`. Defaults to the current directory.
    pub root: Option<PathBuf>,

    /// Whether the plugin is installed at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            root: None,
            enabled: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file for interactive sessions. Defaults to the platform state
    /// directory.
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl ShellConfig {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("termshell")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ShellError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            ShellError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// The state file to use, falling back to the platform default.
    pub fn state_path(&self) -> Result<PathBuf> {
        match &self.state.path {
            Some(path) => Ok(path.clone()),
            None => crate::state::JsonFileStore::default_path(),
        }
    }

    /// The filesystem root to use, falling back to the current directory.
    pub fn filesystem_root(&self) -> PathBuf {
        self.filesystem
            .root
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
