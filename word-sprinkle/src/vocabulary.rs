//! Vocabulary entries and proficiency tiers
//!
//! Vocabulary is bucketed into four cumulative tiers (A1, A2, B1, B2). A learner
//! at a given level sees every entry from A1 up to and including that level.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Grammatical category declared by a vocabulary entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Interjection,
    Number,
    ProperNoun,
}

impl PartOfSpeech {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartOfSpeech::Noun => "noun",
            PartOfSpeech::Verb => "verb",
            PartOfSpeech::Adjective => "adjective",
            PartOfSpeech::Adverb => "adverb",
            PartOfSpeech::Interjection => "interjection",
            PartOfSpeech::Number => "number",
            PartOfSpeech::ProperNoun => "properNoun",
        }
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single source/target word pair
///
/// Optional fields are explicit; an absent `partOfSpeech` means the entry
/// never goes through the grammatical gate.
///
/// ```json
/// {"source":"house","target":"Haus","partOfSpeech":"noun","gender":"neuter","article":"das","plural":"Häuser"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyEntry {
    /// English word as it appears in running text
    pub source: String,
    /// German translation with its dictionary casing
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<PartOfSpeech>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

impl VocabularyEntry {
    pub fn new(source: &str, target: &str) -> Self {
        VocabularyEntry {
            source: source.to_string(),
            target: target.to_string(),
            part_of_speech: None,
            gender: None,
            article: None,
            plural: None,
            examples: Vec::new(),
        }
    }

    pub fn with_part_of_speech(mut self, part_of_speech: PartOfSpeech) -> Self {
        self.part_of_speech = Some(part_of_speech);
        self
    }

    pub fn with_article(mut self, article: &str) -> Self {
        self.article = Some(article.to_string());
        self
    }

    pub fn with_gender(mut self, gender: &str) -> Self {
        self.gender = Some(gender.to_string());
        self
    }

    pub fn with_example(mut self, example: &str) -> Self {
        self.examples.push(example.to_string());
        self
    }

    /// Lookup key used by the index
    pub fn key(&self) -> String {
        self.source.to_lowercase()
    }

    pub fn is_noun(&self) -> bool {
        self.part_of_speech == Some(PartOfSpeech::Noun)
    }
}

/// CEFR proficiency tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    A1,
    A2,
    B1,
    B2,
}

impl Level {
    /// All tiers in ascending order
    pub const ALL: [Level; 4] = [Level::A1, Level::A2, Level::B1, Level::B2];

    /// Tiers from the lowest up to and including `self`, ascending
    pub fn cumulative(self) -> impl Iterator<Item = Level> {
        Level::ALL.into_iter().filter(move |level| *level <= self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::A1 => "A1",
            Level::A2 => "A2",
            Level::B1 => "B1",
            Level::B2 => "B2",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Level::A1 => "Beginner - Basic phrases & greetings",
            Level::A2 => "Elementary - Everyday expressions",
            Level::B1 => "Intermediate - Everyday topics",
            Level::B2 => "Upper Intermediate - Complex texts",
        }
    }

    fn tier_position(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A1" => Ok(Level::A1),
            "A2" => Ok(Level::A2),
            "B1" => Ok(Level::B1),
            "B2" => Ok(Level::B2),
            other => Err(format!("Unknown level '{}', expected one of A1, A2, B1, B2", other)),
        }
    }
}

/// The four vocabulary tiers, each an ordered list of entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    tiers: [Vec<VocabularyEntry>; 4],
}

const BUILTIN_A1: &str = include_str!("../data/vocabulary/a1.json");
const BUILTIN_A2: &str = include_str!("../data/vocabulary/a2.json");
const BUILTIN_B1: &str = include_str!("../data/vocabulary/b1.json");
const BUILTIN_B2: &str = include_str!("../data/vocabulary/b2.json");

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// English → German vocabulary bundled with the crate
    pub fn builtin() -> Result<Self, String> {
        let mut vocabulary = Vocabulary::new();
        for (level, source) in Level::ALL
            .into_iter()
            .zip([BUILTIN_A1, BUILTIN_A2, BUILTIN_B1, BUILTIN_B2])
        {
            let entries: Vec<VocabularyEntry> = serde_json::from_str(source)
                .map_err(|e| format!("Failed to parse built-in {} vocabulary: {}", level, e))?;
            vocabulary.with_tier(level, entries);
        }
        Ok(vocabulary)
    }

    /// Replace the entries of one tier
    pub fn with_tier(&mut self, level: Level, entries: Vec<VocabularyEntry>) -> &mut Self {
        self.tiers[level.tier_position()] = entries;
        self
    }

    pub fn add_entry(&mut self, level: Level, entry: VocabularyEntry) {
        self.tiers[level.tier_position()].push(entry);
    }

    pub fn tier(&self, level: Level) -> &[VocabularyEntry] {
        &self.tiers[level.tier_position()]
    }

    /// Entries of every tier at or below `level`, concatenated in ascending tier order
    pub fn entries_for_level(&self, level: Level) -> impl Iterator<Item = &VocabularyEntry> {
        level.cumulative().flat_map(move |tier| self.tier(tier).iter())
    }

    pub fn len(&self) -> usize {
        self.tiers.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
