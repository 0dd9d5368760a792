//! Page-pass orchestration for word-sprinkle
//!
//! This crate wraps the substitution primitives of `word_sprinkle` in a
//! per-document engine with persisted settings, daily learning progress and a
//! favorites list.
//!
//! # Overview
//!
//! 1. **Store** - `SettingsStore` trait with in-memory, JSON file and mock backends
//! 2. **Settings** - enabled flag, level and frequency with per-field defaults
//! 3. **Progress** - daily page and new-word counters
//! 4. **Favorites** - persisted list of favorite target words
//! 5. **Engine** - scan, sample, substitute, record, and react to settings changes
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use word_sprinkle::{Document, Vocabulary};
//! use word_sprinkle_engine::{JsonFileStore, SettingsUpdate, SprinkleEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let vocabulary = Arc::new(Vocabulary::builtin()?);
//!     let store = Arc::new(JsonFileStore::new("sprinkle.json"));
//!     let mut engine = SprinkleEngine::seeded(vocabulary, store, 7);
//!     engine.initialize().await;
//!
//!     let mut document = Document::from_plain_text("I see a house today.");
//!     engine.process_page(&mut document).await;
//!
//!     let disable = SettingsUpdate { enabled: Some(false), ..Default::default() };
//!     engine.on_settings_changed(&mut document, &disable).await;
//!     assert_eq!(document.text_content(), "I see a house today.");
//!     Ok(())
//! }
//! ```

pub mod annotation;
pub mod engine;
pub mod error;
pub mod favorites;
pub mod mock;
pub mod progress;
pub mod settings;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use annotation::{Annotation, Example};
pub use engine::{EngineOptions, PassReport, SprinkleEngine, Transition};
pub use error::{EngineError, EngineResult};
pub use favorites::FavoriteRegistry;
pub use mock::{MockMode, MockStore};
pub use progress::{DATE_FORMAT, PageProgress, ProgressState, ProgressTracker, SeenWordsPolicy};
pub use settings::{HostMessage, Settings, SettingsUpdate, keys};
pub use store::{JsonFileStore, MemoryStore, SettingsStore, StoreValues};
