//! User settings and the host notification message

use crate::error::{EngineError, EngineResult};
use crate::store::{SettingsStore, StoreValues};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;
use word_sprinkle::Level;

/// Store keys shared by settings, progress and favorites
pub mod keys {
    pub const ENABLED: &str = "enabled";
    pub const LEVEL: &str = "level";
    pub const FREQUENCY: &str = "frequency";
    pub const WORDS_TODAY: &str = "wordsToday";
    pub const PAGES_COUNT: &str = "pagesCount";
    pub const LAST_RESET_DATE: &str = "lastResetDate";
    pub const SEEN_WORDS_LIST: &str = "seenWordsList";
    pub const FAVORITES: &str = "favorites";

    pub const SETTINGS: [&str; 3] = [ENABLED, LEVEL, FREQUENCY];
    pub const PROGRESS: [&str; 4] = [WORDS_TODAY, PAGES_COUNT, LAST_RESET_DATE, SEEN_WORDS_LIST];
}

/// Engine settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub enabled: bool,
    pub level: Level,
    /// Percentage of eligible candidates to substitute, 0 to 100
    pub frequency: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: Level::B1,
            frequency: 15,
        }
    }
}

impl Settings {
    /// Load settings from `store`.
    ///
    /// Never fails: an unreachable store yields the defaults, and each
    /// missing or malformed value falls back to its own default.
    pub async fn load(store: &dyn SettingsStore) -> Self {
        match store.get(&keys::SETTINGS).await {
            Ok(values) => Self::from_values(&values),
            Err(e) => {
                warn!(
                    "Could not read settings from {} store, using defaults: {}",
                    store.store_name(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Build settings from raw store values, defaulting field by field
    pub fn from_values(values: &StoreValues) -> Self {
        let mut settings = Self::default();

        if let Some(value) = values.get(keys::ENABLED) {
            match value.as_bool() {
                Some(enabled) => settings.enabled = enabled,
                None => warn!("Ignoring malformed '{}' value: {}", keys::ENABLED, value),
            }
        }
        if let Some(value) = values.get(keys::LEVEL) {
            match value.as_str().map(str::parse::<Level>) {
                Some(Ok(level)) => settings.level = level,
                _ => warn!("Ignoring malformed '{}' value: {}", keys::LEVEL, value),
            }
        }
        if let Some(value) = values.get(keys::FREQUENCY) {
            match parse_frequency(value) {
                Ok(frequency) => settings.frequency = frequency,
                Err(e) => warn!("{}", e),
            }
        }
        settings
    }

    /// Apply a partial update, returning the merged settings
    pub fn merge(&self, update: &SettingsUpdate) -> Self {
        Self {
            enabled: update.enabled.unwrap_or(self.enabled),
            level: update.level.unwrap_or(self.level),
            frequency: update.frequency.map_or(self.frequency, |f| f.min(100)),
        }
    }

    pub fn to_values(&self) -> StoreValues {
        let mut values = StoreValues::new();
        values.insert(keys::ENABLED.to_string(), json!(self.enabled));
        values.insert(keys::LEVEL.to_string(), json!(self.level.as_str()));
        values.insert(keys::FREQUENCY.to_string(), json!(self.frequency));
        values
    }

    pub async fn save(&self, store: &dyn SettingsStore) -> EngineResult<()> {
        store.set(self.to_values()).await
    }
}

fn parse_frequency(value: &Value) -> EngineResult<u8> {
    value
        .as_u64()
        .filter(|f| *f <= 100)
        .and_then(|f| u8::try_from(f).ok())
        .ok_or_else(|| {
            EngineError::SettingsError(format!(
                "Ignoring malformed '{}' value: {}",
                keys::FREQUENCY,
                value
            ))
        })
}

/// A partial settings change; absent fields keep their current value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u8>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none() && self.level.is_none() && self.frequency.is_none()
    }
}

impl From<Settings> for SettingsUpdate {
    fn from(settings: Settings) -> Self {
        Self {
            enabled: Some(settings.enabled),
            level: Some(settings.level),
            frequency: Some(settings.frequency),
        }
    }
}

/// Messages delivered from the host UI to a running engine
///
/// ```json
/// {"type":"SETTINGS_UPDATED","settings":{"level":"A2"}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostMessage {
    SettingsUpdated { settings: SettingsUpdate },
}
