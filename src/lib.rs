//! termshell - a small shell-like command interpreter.
//!
//! Parses command lines, resolves them against a tree of processors and runs
//! them with validation, hooks, cancellation and chaining (`&&`, `||`, `|`,
//! `>>`). The library is what the binary and the integration tests build on.

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod fs;
pub mod logging;
pub mod state;
