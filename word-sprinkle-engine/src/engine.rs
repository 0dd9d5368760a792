//! The sprinkle engine
//!
//! A `SprinkleEngine` owns everything one document needs: the current
//! settings, the vocabulary and its level index, an optional context tagger,
//! the random source used for sampling, and the guard that keeps a document
//! from being processed twice.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use word_sprinkle::{Document, Vocabulary};
//! use word_sprinkle_engine::{MemoryStore, SprinkleEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let vocabulary = Arc::new(Vocabulary::builtin()?);
//!     let mut engine = SprinkleEngine::new(vocabulary, Arc::new(MemoryStore::new()));
//!     engine.initialize().await;
//!
//!     let mut document = Document::from_plain_text("I see a house today.");
//!     if let Some(report) = engine.process_page(&mut document).await {
//!         println!("{} words placed", report.placed.len());
//!     }
//!     Ok(())
//! }
//! ```

use crate::annotation::Annotation;
use crate::favorites::FavoriteRegistry;
use crate::progress::{PageProgress, ProgressTracker, SeenWordsPolicy};
use crate::settings::{HostMessage, Settings, SettingsUpdate};
use crate::store::SettingsStore;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use word_sprinkle::{
    Candidate, ContentTree, ContextTagger, LexiconTagger, NodeId, SubstitutionRecord, Vocabulary,
    VocabularyIndex, apply_batch, revert_all, scan, select,
};

/// Engine behavior that is not part of the stored settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub seen_words_policy: SeenWordsPolicy,
    /// Gate matches through a tagger built from the active vocabulary
    pub lexicon_tagger: bool,
}

/// Summary of one substitution pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    /// Eligible matches found by the scan
    pub candidates: usize,
    /// Matches chosen by the sampler
    pub selected: usize,
    /// Substitutions that made it into the tree, in application order
    pub placed: Vec<SubstitutionRecord>,
    #[serde(skip)]
    pub markers: Vec<NodeId>,
    /// Selected matches that could not be applied
    pub failed: usize,
    /// Progress after this page; absent when nothing was eligible
    pub progress: Option<PageProgress>,
}

impl PassReport {
    /// Target words placed on the page
    pub fn placed_words(&self) -> Vec<String> {
        self.placed
            .iter()
            .map(|record| record.rendered_text.clone())
            .collect()
    }
}

/// What a settings change did to the document
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Substitution was switched off and all markers reverted
    Disabled { reverted: usize },
    /// Substitution was switched on and a fresh pass ran
    Enabled { report: Option<PassReport> },
    /// The level changed while enabled; markers were reverted and the pass rerun
    LevelChanged {
        reverted: usize,
        report: Option<PassReport>,
    },
    /// The engine is not initialized yet; the change applies at initialization
    Deferred,
    /// Nothing to redo (frequency-only changes, repeated values)
    Unchanged,
}

/// Per-document substitution engine
pub struct SprinkleEngine<R = StdRng> {
    settings: Settings,
    vocabulary: Arc<Vocabulary>,
    index: Option<VocabularyIndex>,
    tagger: Option<Box<dyn ContextTagger + Send + Sync>>,
    lexicon_tagger: bool,
    rng: R,
    processed: bool,
    initialized: bool,
    pending: SettingsUpdate,
    progress: ProgressTracker,
    favorites: FavoriteRegistry,
    store: Arc<dyn SettingsStore>,
    today: Option<NaiveDate>,
}

impl SprinkleEngine {
    /// Create an engine sampling with an entropy-seeded RNG
    pub fn new(vocabulary: Arc<Vocabulary>, store: Arc<dyn SettingsStore>) -> Self {
        Self::with_rng(vocabulary, store, StdRng::from_entropy())
    }

    /// Create an engine whose sampling is reproducible for `seed`
    pub fn seeded(vocabulary: Arc<Vocabulary>, store: Arc<dyn SettingsStore>, seed: u64) -> Self {
        Self::with_rng(vocabulary, store, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SprinkleEngine<R> {
    pub fn with_rng(vocabulary: Arc<Vocabulary>, store: Arc<dyn SettingsStore>, rng: R) -> Self {
        Self {
            settings: Settings::default(),
            vocabulary,
            index: None,
            tagger: None,
            lexicon_tagger: false,
            rng,
            processed: false,
            initialized: false,
            pending: SettingsUpdate::default(),
            progress: ProgressTracker::new(store.clone()),
            favorites: FavoriteRegistry::new(store.clone()),
            store,
            today: None,
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.progress = self.progress.with_policy(options.seen_words_policy);
        self.lexicon_tagger = options.lexicon_tagger;
        self
    }

    /// Gate matches through `tagger` instead of boundary matching alone
    pub fn with_tagger(mut self, tagger: Box<dyn ContextTagger + Send + Sync>) -> Self {
        self.tagger = Some(tagger);
        self.lexicon_tagger = false;
        self
    }

    /// Record progress as if every page were processed on `date`
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.today = Some(date);
        self
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn index(&self) -> Option<&VocabularyIndex> {
        self.index.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether the current document has already had its pass
    pub fn is_processed(&self) -> bool {
        self.processed
    }

    pub fn store(&self) -> &Arc<dyn SettingsStore> {
        &self.store
    }

    /// Load settings and prepare the index.
    ///
    /// Unreadable settings fall back to the defaults; this never fails.
    pub async fn initialize(&mut self) -> Settings {
        self.initialize_with(&SettingsUpdate::default()).await
    }

    /// Load settings, then apply `overrides` on top without persisting them
    pub async fn initialize_with(&mut self, overrides: &SettingsUpdate) -> Settings {
        let loaded = Settings::load(self.store.as_ref()).await;
        let pending = std::mem::take(&mut self.pending);
        self.settings = loaded.merge(&pending).merge(overrides);
        self.initialized = true;

        if self.settings.enabled {
            self.rebuild_index();
        }
        info!(
            "Engine initialized: enabled={}, level={}, frequency={}%",
            self.settings.enabled, self.settings.level, self.settings.frequency
        );
        self.settings
    }

    fn rebuild_index(&mut self) {
        let index = VocabularyIndex::build(&self.vocabulary, self.settings.level);
        debug!(
            "Built {} index with {} entries",
            self.settings.level,
            index.len()
        );
        if self.lexicon_tagger {
            self.tagger = Some(Box::new(LexiconTagger::from_index(&index)));
        }
        self.index = Some(index);
    }

    fn collect_candidates<T>(&self, tree: &T) -> Vec<Candidate>
    where
        T: ContentTree + ?Sized,
    {
        let Some(index) = self.index.as_ref() else {
            return Vec::new();
        };
        let tagger = self
            .tagger
            .as_deref()
            .map(|tagger| tagger as &dyn ContextTagger);
        scan(tree, index, tagger)
    }

    /// Run the substitution pass over `tree`.
    ///
    /// Returns `None` without touching the tree when the engine is not
    /// initialized, disabled, or has already processed this document. A
    /// document with no eligible words still consumes its pass.
    pub async fn process_page<T>(&mut self, tree: &mut T) -> Option<PassReport>
    where
        T: ContentTree + ?Sized,
    {
        if !self.initialized {
            debug!("Skipping pass: engine not initialized");
            return None;
        }
        if !self.settings.enabled {
            debug!("Skipping pass: disabled");
            return None;
        }
        if self.processed {
            debug!("Skipping pass: already processed");
            return None;
        }
        self.processed = true;

        let candidates = self.collect_candidates(tree);
        let total = candidates.len();
        if total == 0 {
            info!("No eligible words on page");
            return Some(PassReport::default());
        }

        let selected = select(candidates, self.settings.frequency, &mut self.rng);
        let outcome = apply_batch(tree, &selected);

        let mut report = PassReport {
            candidates: total,
            selected: selected.len(),
            failed: outcome.failed.len(),
            ..Default::default()
        };
        for applied in outcome.applied {
            report.markers.push(applied.marker);
            report.placed.push(applied.record);
        }

        let placed = report.placed_words();
        let progress = match self.today {
            Some(date) => self.progress.record_page_on(date, &placed).await,
            None => self.progress.record_page(&placed).await,
        };
        info!(
            "Placed {} of {} eligible words ({} new today, {} failed)",
            report.placed.len(),
            total,
            progress.new_count,
            report.failed
        );
        report.progress = Some(progress);
        Some(report)
    }

    /// React to a settings change delivered by the host.
    pub async fn on_settings_changed<T>(&mut self, tree: &mut T, update: &SettingsUpdate) -> Transition
    where
        T: ContentTree + ?Sized,
    {
        if !self.initialized {
            self.pending = SettingsUpdate {
                enabled: update.enabled.or(self.pending.enabled),
                level: update.level.or(self.pending.level),
                frequency: update.frequency.or(self.pending.frequency),
            };
            debug!("Settings change deferred until initialization");
            return Transition::Deferred;
        }

        let previous = self.settings;
        self.settings = previous.merge(update);
        let current = self.settings;

        match (previous.enabled, current.enabled) {
            (true, false) => {
                let reverted = revert_all(tree);
                self.index = None;
                info!("Disabled: reverted {} substitutions", reverted);
                Transition::Disabled { reverted }
            }
            (false, true) => {
                self.rebuild_index();
                let stale = revert_all(tree);
                if stale > 0 {
                    debug!("Reverted {} stale substitutions before enabling", stale);
                }
                self.processed = false;
                info!("Enabled at level {}", current.level);
                let report = self.process_page(tree).await;
                Transition::Enabled { report }
            }
            (true, true) if previous.level != current.level => {
                self.rebuild_index();
                let reverted = revert_all(tree);
                self.processed = false;
                info!(
                    "Level changed from {} to {}: reverted {} substitutions",
                    previous.level, current.level, reverted
                );
                let report = self.process_page(tree).await;
                Transition::LevelChanged { reverted, report }
            }
            _ => {
                if previous.frequency != current.frequency {
                    debug!(
                        "Frequency changed to {}%, applies to the next document",
                        current.frequency
                    );
                }
                Transition::Unchanged
            }
        }
    }

    /// Dispatch a message sent by the host UI
    pub async fn handle_message<T>(&mut self, tree: &mut T, message: &HostMessage) -> Transition
    where
        T: ContentTree + ?Sized,
    {
        match message {
            HostMessage::SettingsUpdated { settings } => {
                self.on_settings_changed(tree, settings).await
            }
        }
    }

    /// Card data for `marker`, or `None` if it is not a marker node
    pub async fn annotation_for<T>(&self, tree: &T, marker: NodeId) -> Option<Annotation>
    where
        T: ContentTree + ?Sized,
    {
        let record = tree.marker(marker)?.clone();
        let entry = self
            .index
            .as_ref()
            .and_then(|index| index.get(&record.original_text))
            .cloned();
        let mut annotation = Annotation::new(&record, entry, false);
        annotation.is_favorite = self.favorites.is_favorite(&annotation.target_word).await;
        Some(annotation)
    }

    /// Mark or unmark `word` as a favorite, returning the updated list
    ///
    /// Hosts pass the `target_word` of an [`Annotation`], which is the form
    /// `annotation_for` checks when it reports `is_favorite`.
    pub async fn toggle_favorite(&self, word: &str, make_favorite: bool) -> Vec<String> {
        self.favorites.toggle(word, make_favorite).await
    }

    pub async fn favorites(&self) -> Vec<String> {
        self.favorites.list().await
    }
}
