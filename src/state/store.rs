//! A named, persistable state bucket with selector subscriptions.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde_json::Value;
use tracing::debug;

use super::kv::KeyValueStore;
use crate::error::Result;

/// Prefix of the storage key derived from a bucket name.
pub const STATE_KEY_PREFIX: &str = "termshell:state:";

/// Returns the storage key for a bucket name.
pub fn state_key(name: &str) -> String {
    format!("{STATE_KEY_PREFIX}{name}")
}

type Selector = Box<dyn Fn(&Value) -> Value + Send + Sync>;
type Callback = Arc<dyn Fn(&Value) + Send + Sync>;

struct Observer {
    id: u64,
    selector: Selector,
    callback: Callback,
    last: Value,
}

struct BucketState {
    current: Value,
    observers: Vec<Observer>,
    next_observer_id: u64,
}

struct StoreInner {
    name: String,
    key: String,
    default_state: Value,
    kv: Arc<dyn KeyValueStore>,
    state: Mutex<BucketState>,
}

/// Handle to a state bucket. Clones refer to the same bucket.
///
/// `update_state` and `reset` only touch memory; storage is written by
/// `persist` and read by `initialize`.
#[derive(Clone)]
pub struct StateStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("name", &self.inner.name)
            .field("state", &self.get_state())
            .finish()
    }
}

impl StateStore {
    /// Creates a bucket holding `default_state`.
    pub fn new(name: impl Into<String>, default_state: Value, kv: Arc<dyn KeyValueStore>) -> Self {
        let name = name.into();
        Self {
            inner: Arc::new(StoreInner {
                key: state_key(&name),
                name,
                state: Mutex::new(BucketState {
                    current: default_state.clone(),
                    observers: Vec::new(),
                    next_observer_id: 0,
                }),
                default_state,
                kv,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BucketState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The bucket name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The storage key the bucket persists under.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Returns a copy of the current state.
    pub fn get_state(&self) -> Value {
        self.lock().current.clone()
    }

    /// Returns one top-level field of the current state.
    pub fn get(&self, field: &str) -> Option<Value> {
        self.lock().current.get(field).cloned()
    }

    /// Shallow-merges `partial` into the current state.
    ///
    /// Top-level keys of an object `partial` overwrite the current ones;
    /// any other value replaces the state wholesale.
    pub fn update_state(&self, partial: Value) {
        self.mutate(move |current| match (current, partial) {
            (Value::Object(current), Value::Object(partial)) => {
                for (key, value) in partial {
                    current.insert(key, value);
                }
            }
            (current, partial) => *current = partial,
        });
    }

    /// Restores the constructor-time default in memory.
    pub fn reset(&self) {
        let default_state = self.inner.default_state.clone();
        self.mutate(move |current| *current = default_state);
    }

    /// Writes the current state to storage.
    pub async fn persist(&self) -> Result<()> {
        let snapshot = self.get_state();
        self.inner.kv.set(&self.inner.key, snapshot).await?;
        debug!("Persisted state bucket '{}'", self.inner.name);
        Ok(())
    }

    /// Loads the persisted snapshot, if any, overwriting memory.
    pub async fn initialize(&self) -> Result<()> {
        if let Some(snapshot) = self.inner.kv.get(&self.inner.key).await? {
            debug!("Hydrated state bucket '{}'", self.inner.name);
            self.mutate(move |current| *current = snapshot);
        }
        Ok(())
    }

    /// Subscribes to a projection of the state.
    ///
    /// `callback` fires synchronously after a change, and only when the value
    /// returned by `selector` differs from its previous value. The
    /// subscription ends when the returned handle is dropped.
    pub fn select<S, F>(&self, selector: S, callback: F) -> Subscription
    where
        S: Fn(&Value) -> Value + Send + Sync + 'static,
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let mut state = self.lock();
        let id = state.next_observer_id;
        state.next_observer_id += 1;
        let last = selector(&state.current);
        state.observers.push(Observer {
            id,
            selector: Box::new(selector),
            callback: Arc::new(callback),
            last,
        });

        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.lock().observers.len()
    }

    fn mutate(&self, change: impl FnOnce(&mut Value)) {
        let fired: Vec<(Callback, Value)> = {
            let mut state = self.lock();
            let BucketState {
                current, observers, ..
            } = &mut *state;
            change(current);

            observers
                .iter_mut()
                .filter_map(|observer| {
                    let projection = (observer.selector)(current);
                    if projection == observer.last {
                        return None;
                    }
                    observer.last = projection.clone();
                    Some((Arc::clone(&observer.callback), projection))
                })
                .collect()
        };

        // Callbacks run unlocked so they may read or update the bucket.
        for (callback, projection) in fired {
            callback(&projection);
        }
    }
}

/// Keeps a `select` subscription alive.
#[must_use = "the subscription ends when this handle is dropped"]
pub struct Subscription {
    id: u64,
    store: Weak<StoreInner>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            let mut state = inner
                .state
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            state.observers.retain(|observer| observer.id != self.id);
        }
    }
}
