//! Processor registry: the mutable command tree.
//!
//! Registration follows three rules when a sibling with the same name or
//! alias already exists:
//! - an extending processor takes the slot and keeps the old one as a
//!   back-reference,
//! - a sealed processor rejects any other replacement,
//! - otherwise the new processor replaces the old one in place.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::processor::Processor;
use crate::error::{Result, ShellError};

/// A processor found by resolution, with how many path words it consumed.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub processor: Arc<Processor>,
    pub depth: usize,
}

/// The top level of the command tree.
#[derive(Debug, Clone, Default)]
pub struct ProcessorRegistry {
    processors: Vec<Arc<Processor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered top-level processors, in registration order.
    pub fn processors(&self) -> &[Arc<Processor>] {
        &self.processors
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Adds a processor at the top level.
    ///
    /// Fails with `ShellError::Registry` when the slot is held by a sealed
    /// processor and `processor` does not extend it, or when its names clash
    /// with more than one sibling. The registry is left unchanged in both
    /// cases.
    pub fn register_processor(&mut self, processor: Processor) -> Result<Arc<Processor>> {
        let clashes: Vec<usize> = self
            .processors
            .iter()
            .enumerate()
            .filter(|(_, existing)| existing.conflicts_with(&processor))
            .map(|(index, _)| index)
            .collect();

        if clashes.len() > 1 {
            let names: Vec<&str> = clashes
                .iter()
                .map(|&index| self.processors[index].command())
                .collect();
            warn!(
                "Refusing to register '{}': its names clash with {}",
                processor.command(),
                names.join(", ")
            );
            return Err(ShellError::registry(format!(
                "processor '{}' clashes with several processors: {}",
                processor.command(),
                names.join(", ")
            )));
        }

        let Some(&index) = clashes.first() else {
            info!("Registered processor '{}'", processor.command());
            let processor = Arc::new(processor);
            self.processors.push(Arc::clone(&processor));
            return Ok(processor);
        };

        let existing = Arc::clone(&self.processors[index]);
        let installed = if processor.is_extension() {
            info!(
                "Processor '{}' extends '{}'",
                processor.command(),
                existing.command()
            );
            Arc::new(processor.wrapping(existing))
        } else if existing.is_sealed() {
            warn!(
                "Refusing to replace sealed processor '{}' with '{}'",
                existing.command(),
                processor.command()
            );
            return Err(ShellError::registry(format!(
                "processor '{}' is sealed and can only be extended",
                existing.command()
            )));
        } else {
            info!("Replaced processor '{}'", existing.command());
            Arc::new(processor)
        };

        self.processors[index] = Arc::clone(&installed);
        Ok(installed)
    }

    /// Removes the processor answering to `name`.
    ///
    /// An extension is popped, restoring the processor it wrapped. A sealed
    /// processor that extends nothing cannot be removed. Returns the
    /// processor that left the slot.
    pub fn unregister_processor(&mut self, name: &str) -> Result<Arc<Processor>> {
        let index = self
            .processors
            .iter()
            .position(|p| p.matches(name))
            .ok_or_else(|| ShellError::registry(format!("no processor named '{name}'")))?;

        let current = Arc::clone(&self.processors[index]);
        if let Some(original) = current.wrapped() {
            info!(
                "Unregistered extension '{}', restored '{}'",
                current.command(),
                original.command()
            );
            self.processors[index] = Arc::clone(original);
        } else if current.is_sealed() {
            warn!("Refusing to unregister sealed processor '{}'", current.command());
            return Err(ShellError::registry(format!(
                "processor '{}' is sealed and cannot be removed",
                current.command()
            )));
        } else {
            info!("Unregistered processor '{}'", current.command());
            self.processors.remove(index);
        }
        Ok(current)
    }

    /// Looks up a path of words, e.g. `["alias", "set"]`.
    pub fn find(&self, words: &[String]) -> Option<Arc<Processor>> {
        let (main, chain) = words.split_first()?;
        find_processor_in_collection(main, chain, &self.processors)
    }

    /// Like `find`, also reporting how many words were consumed.
    pub fn resolve(&self, words: &[String]) -> Option<Resolved> {
        let (main, chain) = words.split_first()?;
        resolve_in_collection(main, chain, &self.processors)
    }
}

/// Finds the processor for `main_command` followed by `chain` among
/// `processors`.
pub fn find_processor_in_collection(
    main_command: &str,
    chain: &[String],
    processors: &[Arc<Processor>],
) -> Option<Arc<Processor>> {
    resolve_in_collection(main_command, chain, processors).map(|resolved| resolved.processor)
}

/// Resolution with depth tracking.
///
/// With chain words left, the match's children are searched with the next
/// word. When that fails, a match that takes free text still resolves and
/// leaves the rest of the chain as its value.
pub fn resolve_in_collection(
    main_command: &str,
    chain: &[String],
    processors: &[Arc<Processor>],
) -> Option<Resolved> {
    let found = processors.iter().find(|p| p.matches(main_command))?;

    let Some((next, rest)) = chain.split_first() else {
        return Some(Resolved {
            processor: Arc::clone(found),
            depth: 1,
        });
    };

    if found.has_children() {
        if let Some(mut resolved) = resolve_in_collection(next, rest, found.children()) {
            resolved.depth += 1;
            return Some(resolved);
        }
    }

    if found.takes_value() {
        debug!(
            "'{}' takes '{}' as free text",
            found.command(),
            chain.join(" ")
        );
        return Some(Resolved {
            processor: Arc::clone(found),
            depth: 1,
        });
    }

    None
}
