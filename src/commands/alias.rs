//! User-defined command shortcuts.
//!
//! Aliases live in the `alias` state bucket as `{"aliases": {name: command}}`
//! so they persist like any other processor state.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use super::parser::{parse, skip_words};
use crate::context::ExecutionContext;
use crate::error::Result;
use crate::state::StateStore;

/// Name of the bucket holding the alias table.
pub const ALIAS_STORE: &str = "alias";

/// Maximum number of nested alias expansions for one segment.
pub const MAX_ALIAS_DEPTH: usize = 8;

/// The empty alias table.
pub fn default_alias_state() -> Value {
    json!({ "aliases": {} })
}

/// View over the alias bucket.
#[derive(Debug, Clone)]
pub struct AliasTable {
    store: StateStore,
}

impl AliasTable {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// Binds to the session's alias bucket, creating it if needed.
    pub fn from_context(ctx: &mut ExecutionContext) -> Self {
        Self::new(
            ctx.states_mut()
                .get_state_store(ALIAS_STORE, default_alias_state()),
        )
    }

    fn entries(&self) -> Map<String, Value> {
        match self.store.get("aliases") {
            Some(Value::Object(entries)) => entries,
            _ => Map::new(),
        }
    }

    /// The command an alias stands for.
    pub fn get(&self, name: &str) -> Option<String> {
        self.entries()
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Defines or redefines an alias. Memory only until `persist`.
    pub fn set(&self, name: &str, command: &str) {
        let mut entries = self.entries();
        entries.insert(name.to_string(), Value::String(command.to_string()));
        self.store.update_state(json!({ "aliases": entries }));
    }

    /// Deletes an alias, returning whether it existed.
    pub fn remove(&self, name: &str) -> bool {
        let mut entries = self.entries();
        let existed = entries.remove(name).is_some();
        if existed {
            self.store.update_state(json!({ "aliases": entries }));
        }
        existed
    }

    /// All aliases sorted by name.
    pub fn list(&self) -> BTreeMap<String, String> {
        self.entries()
            .into_iter()
            .filter_map(|(name, command)| command.as_str().map(|c| (name, c.to_string())))
            .collect()
    }

    /// Rewrites `segment` if its first word is an alias.
    ///
    /// The alias body replaces the first word; the rest of the segment is
    /// appended verbatim.
    pub fn expand(&self, segment: &str) -> Option<String> {
        let parsed = parse(segment);
        let command = self.get(parsed.root()?)?;
        let rest = skip_words(segment, 1);
        Some(if rest.is_empty() {
            command
        } else {
            format!("{command} {rest}")
        })
    }

    pub async fn persist(&self) -> Result<()> {
        self.store.persist().await
    }
}
