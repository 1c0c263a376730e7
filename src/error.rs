//! Error types for termshell.
//!
//! `ShellError` covers infrastructure failures (config, storage, filesystem,
//! registry). `CommandError` is what command handlers and hooks return; the
//! executor matches it at the segment boundary.

use thiserror::Error;

/// Main error type for termshell operations.
#[derive(Error, Debug)]
pub enum ShellError {
    /// Configuration errors (invalid config file, unreadable path, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key-value storage errors (unreadable state file, bad JSON, etc.)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem plugin errors (missing file, path is a directory, etc.)
    #[error("Filesystem error: {0}")]
    Filesystem(String),

    /// Processor registry errors (sealed processor, unknown processor)
    #[error("Registry error: {0}")]
    Registry(String),

    /// Internal errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShellError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a storage error with the given message.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Creates a filesystem error with the given message.
    pub fn filesystem(msg: impl Into<String>) -> Self {
        Self::Filesystem(msg.into())
    }

    /// Creates a registry error with the given message.
    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Storage(_) => "Storage Error",
            Self::Filesystem(_) => "Filesystem Error",
            Self::Registry(_) => "Registry Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using ShellError.
pub type Result<T> = std::result::Result<T, ShellError>;

/// Outcome of a handler or hook that did not complete normally.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The handler called `exit()`; unwinds to the segment boundary.
    #[error("process exited with code {code}")]
    Exited { code: i32 },

    /// The handler observed the context's abort signal.
    #[error("command cancelled")]
    Cancelled,

    /// An infrastructure call made by the handler failed.
    #[error(transparent)]
    Shell(#[from] ShellError),

    /// Anything else raised by a handler body.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CommandError {
    /// Creates a generic failure from a message.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Other(anyhow::anyhow!(msg.into()))
    }

    /// Returns the exit code if this is the "process exited" signal.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Exited { code } => Some(*code),
            _ => None,
        }
    }
}

/// Result returned by command handlers and hooks.
pub type CommandResult = std::result::Result<(), CommandError>;
