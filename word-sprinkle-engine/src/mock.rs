//! Mock settings store for testing
//!
//! Wraps a [`MemoryStore`] and can be switched into failure modes so the
//! degradation paths of the engine (defaults on unreadable settings, swallowed
//! persistence errors) can be exercised without touching the filesystem.

use crate::error::{EngineError, EngineResult};
use crate::store::{MemoryStore, SettingsStore, StoreValues};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Failure modes for the mock store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockMode {
    /// Behave like an in-memory store
    Normal,

    /// Every read fails, writes succeed
    FailReads,

    /// Every write fails, reads succeed
    FailWrites,

    /// Both reads and writes fail
    Unavailable,
}

/// Store double that records traffic and can simulate failures
#[derive(Debug)]
pub struct MockStore {
    mode: MockMode,
    inner: MemoryStore,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MockStore {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            inner: MemoryStore::new(),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Create a mock whose backing map already holds `values`
    pub fn with_values(mode: MockMode, values: StoreValues) -> Self {
        Self {
            inner: MemoryStore::with_values(values),
            ..Self::new(mode)
        }
    }

    /// Number of `get` calls, successful or not
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `set` calls, successful or not
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Everything that reached the backing map
    pub async fn snapshot(&self) -> StoreValues {
        self.inner.snapshot().await
    }
}

#[async_trait]
impl SettingsStore for MockStore {
    async fn get(&self, keys: &[&str]) -> EngineResult<StoreValues> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            MockMode::FailReads | MockMode::Unavailable => Err(EngineError::StoreError(
                "simulated read failure".to_string(),
            )),
            _ => self.inner.get(keys).await,
        }
    }

    async fn set(&self, values: StoreValues) -> EngineResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            MockMode::FailWrites | MockMode::Unavailable => Err(EngineError::StoreError(
                "simulated write failure".to_string(),
            )),
            _ => self.inner.set(values).await,
        }
    }

    fn store_name(&self) -> &str {
        "Mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn level(value: &str) -> StoreValues {
        let mut values = StoreValues::new();
        values.insert("level".to_string(), json!(value));
        values
    }

    #[tokio::test]
    async fn test_normal_mode_round_trips() {
        let store = MockStore::new(MockMode::Normal);
        store.set(level("A2")).await.unwrap();
        let read = store.get(&["level"]).await.unwrap();
        assert_eq!(read["level"], json!("A2"));
        assert_eq!(store.read_count(), 1);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_fail_writes_keeps_backing_map_untouched() {
        let store = MockStore::with_values(MockMode::FailWrites, level("A1"));
        assert!(store.set(level("B2")).await.is_err());
        assert_eq!(store.snapshot().await["level"], json!("A1"));
        assert!(store.get(&["level"]).await.is_ok());
    }

    #[tokio::test]
    async fn test_unavailable_fails_everything() {
        let store = MockStore::new(MockMode::Unavailable);
        assert!(store.get(&["level"]).await.is_err());
        assert!(store.set(level("A1")).await.is_err());
        assert_eq!(store.store_name(), "Mock");
    }
}
