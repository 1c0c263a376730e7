//! Per-processor state buckets and their storage.

pub mod kv;
pub mod manager;
pub mod store;

pub use kv::{JsonFileStore, KeyValueStore, MemoryKeyValueStore};
pub use manager::StateManager;
pub use store::{state_key, StateStore, Subscription};
