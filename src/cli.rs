//! Command-line argument parsing for termshell.

use crate::config::ShellConfig;
use clap::Parser;
use std::path::PathBuf;

/// A small shell-like command interpreter.
#[derive(Parser, Debug)]
#[command(name = "termshell")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// State file path (overrides the config file)
    #[arg(long, value_name = "PATH", env = "TERMSHELL_STATE")]
    pub state: Option<PathBuf>,

    /// Directory the filesystem plugin maps to `/`
    #[arg(long, value_name = "DIR")]
    pub fs_root: Option<PathBuf>,

    /// Run without the filesystem plugin
    #[arg(long)]
    pub no_fs: bool,

    /// Run one line and exit with its status
    #[arg(short = 'c', long, value_name = "LINE")]
    pub command: Option<String>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(ShellConfig::default_path)
    }

    /// Applies command-line overrides on top of the file configuration.
    pub fn apply_to(&self, config: &mut ShellConfig) {
        if let Some(state) = &self.state {
            config.state.path = Some(state.clone());
        }
        if let Some(root) = &self.fs_root {
            config.filesystem.root = Some(root.clone());
        }
        if self.no_fs {
            config.filesystem.enabled = false;
        }
    }

    /// Returns true when a single line should be run non-interactively.
    pub fn is_one_shot(&self) -> bool {
        self.command.is_some()
    }
}

/// Maps a segment exit code onto a process exit status.
///
/// Negative codes become 1; codes above 255 saturate.
pub fn exit_status(code: i32) -> u8 {
    match code {
        code if code < 0 => 1,
        code => code.min(255) as u8,
    }
}
