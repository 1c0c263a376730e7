//! Logging setup.
//!
//! The interactive REPL shares the terminal with command output, so it logs
//! to a file. One-shot runs (`-c`) log to stderr.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    File,
    Stderr,
}

impl LogTarget {
    pub fn for_session(one_shot: bool) -> Self {
        if one_shot {
            Self::Stderr
        } else {
            Self::File
        }
    }
}

/// `RUST_LOG` wins over the configured level.
fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Installs the global subscriber.
///
/// A log file that cannot be created leaves logging off with a warning on
/// stderr rather than failing the session.
pub fn init(target: LogTarget, config: &LogConfig) {
    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(config))
                .with_writer(std::io::stderr)
                .init();
        }
        LogTarget::File => {
            let path = log_path(config);
            let Some(log_file) = open_log_file(&path) else {
                return;
            };
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(config))
                .with_writer(log_file)
                .with_ansi(false)
                .init();
        }
    }
}

/// Creates (truncating) the log file and its directory.
fn open_log_file(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            return None;
        }
    }
    match File::create(path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Warning: Could not create log file {}: {e}", path.display());
            None
        }
    }
}

/// The configured log file, else `termshell/termshell.log` under the XDG
/// state directory, the config directory or the temp directory.
pub fn log_path(config: &LogConfig) -> PathBuf {
    if let Some(path) = &config.file {
        return path.clone();
    }
    dirs::state_dir()
        .or_else(dirs::config_dir)
        .map(|dir| dir.join("termshell").join("termshell.log"))
        .unwrap_or_else(|| std::env::temp_dir().join("termshell.log"))
}
