use crate::vocabulary::{Level, Vocabulary, VocabularyEntry};
use std::collections::HashMap;

/// Lookup from lowercased source word to its vocabulary entry
#[derive(Debug, Clone, Default)]
pub struct VocabularyIndex(HashMap<String, VocabularyEntry>);

impl VocabularyIndex {
    /// Build the index for a learner at `level`.
    ///
    /// Tiers are concatenated from A1 upward; when a source word appears more
    /// than once, the first (lowest-tier) entry is kept.
    pub fn build(vocabulary: &Vocabulary, level: Level) -> Self {
        Self::from_entries(vocabulary.entries_for_level(level).cloned())
    }

    /// Index an arbitrary entry sequence, first occurrence wins
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = VocabularyEntry>,
    {
        let mut map = HashMap::new();
        for entry in entries {
            map.entry(entry.key()).or_insert(entry);
        }
        VocabularyIndex(map)
    }

    /// Look up a word as it appears in text, case-insensitively
    pub fn get(&self, word: &str) -> Option<&VocabularyEntry> {
        self.0.get(&word.to_lowercase())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.get(word).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &VocabularyEntry> {
        self.0.values()
    }
}
