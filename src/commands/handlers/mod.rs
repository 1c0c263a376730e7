//! Built-in processors.
//!
//! Each handler is a small struct implementing `CommandHandler`; the
//! `*_processor()` constructors attach its metadata.

pub mod alias;
pub mod system;
pub mod text;

use super::registry::ProcessorRegistry;
use crate::error::Result;

pub use alias::alias_processor;
pub use system::{exit_processor, help_processor};
pub use text::{echo_processor, lower_processor, upper_processor};

/// Registers every built-in processor.
pub fn register_builtins(registry: &mut ProcessorRegistry) -> Result<()> {
    registry.register_processor(help_processor())?;
    registry.register_processor(echo_processor())?;
    registry.register_processor(upper_processor())?;
    registry.register_processor(lower_processor())?;
    registry.register_processor(alias_processor())?;
    registry.register_processor(exit_processor())?;
    Ok(())
}

/// A registry holding only the built-ins.
pub fn builtin_registry() -> Result<ProcessorRegistry> {
    let mut registry = ProcessorRegistry::new();
    register_builtins(&mut registry)?;
    Ok(registry)
}
