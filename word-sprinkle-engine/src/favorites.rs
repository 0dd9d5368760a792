use crate::error::{EngineError, EngineResult};
use crate::settings::keys;
use crate::store::{SettingsStore, StoreValues};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

/// Persisted list of target words the reader marked as favorites
///
/// Words are kept in insertion order and compared exactly, so "Haus" and
/// "haus" are distinct favorites.
#[derive(Clone)]
pub struct FavoriteRegistry {
    store: Arc<dyn SettingsStore>,
}

impl FavoriteRegistry {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Add or remove `word`. Repeating the same request changes nothing.
    ///
    /// Store failures are logged and swallowed; the returned list is what the
    /// registry believes is stored afterwards.
    pub async fn toggle(&self, word: &str, make_favorite: bool) -> Vec<String> {
        match self.try_toggle(word, make_favorite).await {
            Ok(list) => list,
            Err(e) => {
                warn!("Failed to update favorite '{}': {}", word, e);
                Vec::new()
            }
        }
    }

    async fn try_toggle(&self, word: &str, make_favorite: bool) -> EngineResult<Vec<String>> {
        let mut list = self.read().await?;
        let present = list.iter().any(|w| w == word);

        match (make_favorite, present) {
            (true, false) => list.push(word.to_string()),
            (false, true) => list.retain(|w| w != word),
            _ => return Ok(list),
        }

        let mut values = StoreValues::new();
        values.insert(keys::FAVORITES.to_string(), json!(list));
        self.store.set(values).await?;
        debug!(
            "Favorite '{}' {}",
            word,
            if make_favorite { "added" } else { "removed" }
        );
        Ok(list)
    }

    pub async fn is_favorite(&self, word: &str) -> bool {
        self.list().await.iter().any(|w| w == word)
    }

    /// All favorites, empty if the store cannot be read
    pub async fn list(&self) -> Vec<String> {
        self.read().await.unwrap_or_else(|e| {
            warn!("Failed to read favorites: {}", e);
            Vec::new()
        })
    }

    async fn read(&self) -> EngineResult<Vec<String>> {
        let values = self.store.get(&[keys::FAVORITES]).await?;
        match values.get(keys::FAVORITES) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()),
            Some(other) => Err(EngineError::SettingsError(format!(
                "'{}' is not a list: {}",
                keys::FAVORITES,
                other
            ))),
        }
    }
}
