//! Key-value storage collaborator.
//!
//! State buckets persist through the `KeyValueStore` trait. Two backends
//! ship with the crate: an in-memory map and a single JSON file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{Result, ShellError};

/// Asynchronous key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// Volatile storage for tests and sessions with persistence disabled.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryKeyValueStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Stores every key in one JSON object on disk.
///
/// The file is read once on open and rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// Returns the default state file path for the current platform.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ShellError::storage("Could not determine config directory"))?;
        Ok(config_dir.join("termshell").join("state.json"))
    }

    /// Opens or creates the store at `path`.
    ///
    /// A corrupted file is moved aside to `*.json.bak` and the store starts
    /// empty.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ShellError::storage(format!(
                    "Failed to create state directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let entries = match tokio::fs::read_to_string(path).await {
            Ok(content) if content.trim().is_empty() => Map::new(),
            Ok(content) => match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(map) => map,
                Err(e) => {
                    warn!("State file {} is corrupted: {e}", path.display());
                    Self::backup_corrupted(path).await?;
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                return Err(ShellError::storage(format!(
                    "Failed to read state file {}: {e}",
                    path.display()
                )))
            }
        };

        info!("State store opened at {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            entries: Mutex::new(entries),
        })
    }

    async fn backup_corrupted(path: &Path) -> Result<()> {
        let backup_path = path.with_extension("json.bak");
        tokio::fs::rename(path, &backup_path).await.map_err(|e| {
            ShellError::storage(format!(
                "Failed to backup corrupted state file to {}: {e}",
                backup_path.display()
            ))
        })?;
        warn!("Backed up corrupted state file to {}", backup_path.display());
        Ok(())
    }

    /// Returns the path to the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), value);

        let content = serde_json::to_string_pretty(&*entries)
            .map_err(|e| ShellError::storage(format!("Failed to encode state: {e}")))?;
        tokio::fs::write(&self.path, content).await.map_err(|e| {
            ShellError::storage(format!(
                "Failed to write state file {}: {e}",
                self.path.display()
            ))
        })
    }
}
