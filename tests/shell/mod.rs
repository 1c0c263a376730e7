//! End-to-end tests for termshell.

pub mod alias_test;
pub mod common;
pub mod executor_test;
pub mod registry_test;
pub mod state_test;
