//! Persistent key/value store abstraction
//!
//! Settings, learning progress and favorites all live behind the
//! `SettingsStore` trait so the engine can run against an in-memory map, a
//! JSON file on disk, or a test double without knowing which.
//!
//! # Example
//!
//! ```ignore
//! use serde_json::json;
//! use word_sprinkle_engine::{MemoryStore, SettingsStore, StoreValues};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::new();
//!     let mut values = StoreValues::new();
//!     values.insert("level".to_string(), json!("A2"));
//!     store.set(values).await?;
//!
//!     let read = store.get(&["level", "frequency"]).await?;
//!     assert_eq!(read.get("level"), Some(&json!("A2")));
//!     assert!(read.get("frequency").is_none());
//!     Ok(())
//! }
//! ```

use crate::error::{EngineError, EngineResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tempfile::NamedTempFile;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// A batch of store values keyed by name
pub type StoreValues = serde_json::Map<String, Value>;

/// Asynchronous key/value storage for engine state
///
/// Reads return only the keys that exist; missing keys are simply absent from
/// the returned map. Writes merge into what is already stored.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read the values stored under `keys`
    async fn get(&self, keys: &[&str]) -> EngineResult<StoreValues>;

    /// Merge `values` into the store
    async fn set(&self, values: StoreValues) -> EngineResult<()>;

    /// Get the store name (for logging/debugging)
    fn store_name(&self) -> &str;
}

fn pick(all: &StoreValues, keys: &[&str]) -> StoreValues {
    keys.iter()
        .filter_map(|key| all.get(*key).map(|value| (key.to_string(), value.clone())))
        .collect()
}

/// Store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<StoreValues>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `values`
    pub fn with_values(values: StoreValues) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }

    /// Copy of everything currently stored
    pub async fn snapshot(&self) -> StoreValues {
        self.values.read().await.clone()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> EngineResult<StoreValues> {
        Ok(pick(&*self.values.read().await, keys))
    }

    async fn set(&self, values: StoreValues) -> EngineResult<()> {
        self.values.write().await.extend(values);
        Ok(())
    }

    fn store_name(&self) -> &str {
        "Memory"
    }
}

/// Store backed by a single JSON object on disk
///
/// A missing file reads as an empty store. Each write rewrites the whole file
/// through a uniquely named temporary sibling that is then persisted over the
/// target, so a crash never leaves a half-written object behind. Every store
/// opened on the same path within the process shares one lock, so concurrent
/// read-modify-write cycles never drop each other's keys.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

/// Locks shared by all stores opened on the same path
static PATH_LOCKS: LazyLock<std::sync::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    LazyLock::new(Default::default);

fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut locks = PATH_LOCKS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    locks.entry(key).or_default().clone()
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            lock: lock_for(&path),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> EngineResult<StoreValues> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StoreValues::new()),
            Err(e) => {
                return Err(EngineError::StoreError(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };
        if content.trim().is_empty() {
            return Ok(StoreValues::new());
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(EngineError::StoreError(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }

    async fn write_all(&self, values: &StoreValues) -> EngineResult<()> {
        let content = serde_json::to_string_pretty(values)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || persist_atomically(&path, content.as_bytes()))
            .await
            .map_err(|e| EngineError::StoreError(format!("Write task failed: {}", e)))?
    }
}

fn persist_atomically(path: &Path, content: &[u8]) -> EngineResult<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let write_error = |e: std::io::Error| {
        EngineError::StoreError(format!("Failed to write {}: {}", path.display(), e))
    };

    let mut temp_file = NamedTempFile::new_in(parent).map_err(write_error)?;
    temp_file.write_all(content).map_err(write_error)?;
    temp_file.as_file().sync_all().map_err(write_error)?;
    temp_file.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}

#[async_trait]
impl SettingsStore for JsonFileStore {
    async fn get(&self, keys: &[&str]) -> EngineResult<StoreValues> {
        let _guard = self.lock.lock().await;
        let all = self.read_all().await?;
        Ok(pick(&all, keys))
    }

    async fn set(&self, values: StoreValues) -> EngineResult<()> {
        let _guard = self.lock.lock().await;
        let mut all = self.read_all().await?;
        debug!("Writing {} keys to {}", values.len(), self.path.display());
        all.extend(values);
        self.write_all(&all).await
    }

    fn store_name(&self) -> &str {
        "JsonFile"
    }
}
