//! State manager: lazily created, memoized buckets.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::kv::{KeyValueStore, MemoryKeyValueStore};
use super::store::StateStore;
use crate::commands::Processor;

/// Owns every state bucket of a session.
pub struct StateManager {
    kv: Arc<dyn KeyValueStore>,
    stores: HashMap<String, StateStore>,
}

impl StateManager {
    /// Creates a manager persisting through `kv`.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            stores: HashMap::new(),
        }
    }

    /// Creates a manager backed by volatile memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()))
    }

    /// Returns the bucket called `name`, creating it on first lookup.
    ///
    /// `default_state` only matters the first time; later lookups return the
    /// existing bucket unchanged.
    pub fn get_state_store(&mut self, name: &str, default_state: Value) -> StateStore {
        let kv = &self.kv;
        self.stores
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!("Creating state bucket '{name}'");
                StateStore::new(name, default_state, Arc::clone(kv))
            })
            .clone()
    }

    /// Returns the bucket a processor reads and writes.
    ///
    /// Uses the processor's declared store name, falling back to its command
    /// name, so unrelated processors can share one bucket on purpose.
    pub fn get_processor_state_store(&mut self, processor: &Processor) -> StateStore {
        self.get_state_store(processor.bucket_name(), processor.default_state_value().clone())
    }

    /// Returns an existing bucket without creating it.
    pub fn existing(&self, name: &str) -> Option<StateStore> {
        self.stores.get(name).cloned()
    }

    /// Names of all buckets created so far.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::in_memory()
    }
}
