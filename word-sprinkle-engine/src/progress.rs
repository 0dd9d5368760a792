//! Daily learning progress
//!
//! Each processed page bumps a page counter and counts the target words the
//! reader has not yet been shown. Counters are scoped to the local calendar
//! day and roll over on the first page of a new day.

use crate::settings::keys;
use crate::store::{SettingsStore, StoreValues};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Format used for `lastResetDate`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// What happens to the seen-words set when the day rolls over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SeenWordsPolicy {
    /// Forget seen words every day, so "new" means new today
    #[default]
    Daily,
    /// Keep seen words forever, so "new" means never shown before
    Lifetime,
}

/// Persisted progress counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    pub words_today: u64,
    pub pages_count: u64,
    #[serde(serialize_with = "serialize_date")]
    pub last_reset_date: NaiveDate,
    /// Lowercased target words already shown
    pub seen_target_words: BTreeSet<String>,
}

fn serialize_date<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(&date.format(DATE_FORMAT))
}

impl ProgressState {
    /// Zeroed state for `today`
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            words_today: 0,
            pages_count: 0,
            last_reset_date: today,
            seen_target_words: BTreeSet::new(),
        }
    }

    /// Decode stored values; anything missing or malformed takes its zero value
    pub fn from_values(values: &StoreValues, today: NaiveDate) -> Self {
        let count = |key: &str| values.get(key).and_then(Value::as_u64).unwrap_or(0);
        let last_reset_date = values
            .get(keys::LAST_RESET_DATE)
            .and_then(Value::as_str)
            .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
            .unwrap_or(today);
        let seen_target_words = values
            .get(keys::SEEN_WORDS_LIST)
            .and_then(Value::as_array)
            .map(|words| {
                words
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_lowercase)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            words_today: count(keys::WORDS_TODAY),
            pages_count: count(keys::PAGES_COUNT),
            last_reset_date,
            seen_target_words,
        }
    }

    pub fn to_values(&self) -> StoreValues {
        let mut values = StoreValues::new();
        values.insert(keys::WORDS_TODAY.to_string(), json!(self.words_today));
        values.insert(keys::PAGES_COUNT.to_string(), json!(self.pages_count));
        values.insert(
            keys::LAST_RESET_DATE.to_string(),
            json!(self.last_reset_date.format(DATE_FORMAT).to_string()),
        );
        values.insert(
            keys::SEEN_WORDS_LIST.to_string(),
            json!(self.seen_target_words),
        );
        values
    }

    /// Start a new day if `today` differs from the last reset date
    fn roll_over(&mut self, today: NaiveDate, policy: SeenWordsPolicy) {
        if self.last_reset_date == today {
            return;
        }
        debug!("Progress rolled over from {} to {}", self.last_reset_date, today);
        self.words_today = 0;
        self.pages_count = 0;
        self.last_reset_date = today;
        if policy == SeenWordsPolicy::Daily {
            self.seen_target_words.clear();
        }
    }
}

/// Result of recording one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageProgress {
    pub state: ProgressState,
    /// Distinct placed words that had not been seen before
    pub new_count: u64,
}

/// Records page visits and newly seen words into the store
#[derive(Clone)]
pub struct ProgressTracker {
    store: Arc<dyn SettingsStore>,
    policy: SeenWordsPolicy,
}

impl ProgressTracker {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self {
            store,
            policy: SeenWordsPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SeenWordsPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> SeenWordsPolicy {
        self.policy
    }

    /// Current state on today's local date, without recording anything
    pub async fn current(&self) -> ProgressState {
        self.current_on(Local::now().date_naive()).await
    }

    /// Current state as of `today`, without recording anything
    pub async fn current_on(&self, today: NaiveDate) -> ProgressState {
        let mut state = self.load(today).await;
        state.roll_over(today, self.policy);
        state
    }

    /// Record a page on today's local date
    pub async fn record_page(&self, placed: &[String]) -> PageProgress {
        self.record_page_on(Local::now().date_naive(), placed).await
    }

    /// Record a page as if it were processed on `today`
    pub async fn record_page_on(&self, today: NaiveDate, placed: &[String]) -> PageProgress {
        let mut state = self.load(today).await;
        state.roll_over(today, self.policy);

        let mut distinct = HashSet::new();
        let mut new_count = 0;
        for word in placed {
            let word = word.to_lowercase();
            if !distinct.insert(word.clone()) {
                continue;
            }
            if state.seen_target_words.insert(word) {
                new_count += 1;
            }
        }
        state.words_today += new_count;
        state.pages_count += 1;

        if let Err(e) = self.store.set(state.to_values()).await {
            warn!(
                "Failed to persist progress to {} store: {}",
                self.store.store_name(),
                e
            );
        }
        debug!(
            "Page recorded: {} new words, {} today over {} pages",
            new_count, state.words_today, state.pages_count
        );

        PageProgress { state, new_count }
    }

    async fn load(&self, today: NaiveDate) -> ProgressState {
        match self.store.get(&keys::PROGRESS).await {
            Ok(values) => ProgressState::from_values(&values, today),
            Err(e) => {
                warn!(
                    "Could not read progress from {} store: {}",
                    self.store.store_name(),
                    e
                );
                ProgressState::fresh(today)
            }
        }
    }
}
