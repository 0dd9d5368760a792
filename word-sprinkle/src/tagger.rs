//! Grammatical-context tagging contract
//!
//! The scanner asks a single question of a tagger: does the token at this
//! position carry tag T? Any tagging facility can sit behind [`ContextTagger`];
//! the crate ships [`LexiconTagger`], a small heuristic implementation, and
//! [`MockTagger`] for tests.

use crate::index::VocabularyIndex;
use crate::vocabulary::PartOfSpeech;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A token inside its segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenContext<'a> {
    /// Full text of the segment holding the token
    pub segment: &'a str,
    pub start: usize,
    pub end: usize,
}

impl<'a> TokenContext<'a> {
    pub fn new(segment: &'a str, start: usize, end: usize) -> Self {
        TokenContext { segment, start, end }
    }

    pub fn word(&self) -> &'a str {
        &self.segment[self.start..self.end]
    }

    /// True when nothing but whitespace and opening punctuation precedes the
    /// token since the last sentence terminator
    pub fn is_sentence_start(&self) -> bool {
        for c in self.segment[..self.start].chars().rev() {
            if matches!(c, '.' | '!' | '?' | ':') {
                return true;
            }
            if c.is_whitespace() || matches!(c, '"' | '\'' | '(' | '[' | '“' | '‘') {
                continue;
            }
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagError(pub String);

impl fmt::Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tagger error: {}", self.0)
    }
}

impl std::error::Error for TagError {}

pub trait ContextTagger {
    /// Whether the token carries `tag` in its context
    fn has_tag(&self, token: &TokenContext<'_>, tag: PartOfSpeech) -> Result<bool, TagError>;

    fn tagger_name(&self) -> &str;
}

/// Dictionary-backed tagger with a capitalization heuristic for proper nouns
///
/// A capitalized token that does not open a sentence is tagged as a proper
/// noun. Other tags come from the lexicon; words missing from the lexicon
/// carry no tag at all.
#[derive(Debug, Clone, Default)]
pub struct LexiconTagger {
    lexicon: HashMap<String, HashSet<PartOfSpeech>>,
}

impl LexiconTagger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the lexicon with the declared part of speech of every index entry
    pub fn from_index(index: &VocabularyIndex) -> Self {
        let mut tagger = LexiconTagger::new();
        for entry in index.entries() {
            if let Some(part_of_speech) = entry.part_of_speech {
                tagger.with_tag(&entry.source, part_of_speech);
            }
        }
        tagger
    }

    pub fn with_tag(&mut self, word: &str, tag: PartOfSpeech) -> &mut Self {
        self.lexicon
            .entry(word.to_lowercase())
            .or_default()
            .insert(tag);
        self
    }

    fn looks_like_proper_noun(token: &TokenContext<'_>) -> bool {
        token
            .word()
            .chars()
            .next()
            .is_some_and(|c| c.is_uppercase())
            && !token.is_sentence_start()
    }
}

impl ContextTagger for LexiconTagger {
    fn has_tag(&self, token: &TokenContext<'_>, tag: PartOfSpeech) -> Result<bool, TagError> {
        if Self::looks_like_proper_noun(token) {
            return Ok(tag == PartOfSpeech::ProperNoun);
        }
        Ok(self
            .lexicon
            .get(&token.word().to_lowercase())
            .is_some_and(|tags| tags.contains(&tag)))
    }

    fn tagger_name(&self) -> &str {
        "Lexicon Tagger"
    }
}

/// Mock tagging modes for testing
#[derive(Debug, Clone)]
pub enum MockTagMode {
    /// Fixed tags per lowercase word, untagged words carry nothing
    Tags(HashMap<String, Vec<PartOfSpeech>>),
    /// Every query fails
    Error(String),
}

#[derive(Debug, Clone)]
pub struct MockTagger {
    mode: MockTagMode,
}

impl MockTagger {
    pub fn new(mode: MockTagMode) -> Self {
        MockTagger { mode }
    }

    pub fn with_tags(tags: &[(&str, PartOfSpeech)]) -> Self {
        let mut map: HashMap<String, Vec<PartOfSpeech>> = HashMap::new();
        for (word, tag) in tags {
            map.entry(word.to_lowercase()).or_default().push(*tag);
        }
        MockTagger::new(MockTagMode::Tags(map))
    }
}

impl ContextTagger for MockTagger {
    fn has_tag(&self, token: &TokenContext<'_>, tag: PartOfSpeech) -> Result<bool, TagError> {
        match &self.mode {
            MockTagMode::Tags(map) => Ok(map
                .get(&token.word().to_lowercase())
                .is_some_and(|tags| tags.contains(&tag))),
            MockTagMode::Error(msg) => Err(TagError(msg.clone())),
        }
    }

    fn tagger_name(&self) -> &str {
        "Mock Tagger"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_start_detection() {
        let text = "Well. House prices rose. \"Bank\" and the Bank";
        assert!(TokenContext::new(text, 0, 4).is_sentence_start());
        assert!(TokenContext::new(text, 6, 11).is_sentence_start());
        assert!(TokenContext::new(text, 26, 30).is_sentence_start());
        assert!(!TokenContext::new(text, 40, 44).is_sentence_start());
    }

    #[test]
    fn test_lexicon_tagger_proper_noun_heuristic() {
        let mut tagger = LexiconTagger::new();
        tagger.with_tag("bank", PartOfSpeech::Noun);

        let text = "I walked to the Bank of England";
        let mid = TokenContext::new(text, 16, 20);
        assert!(tagger.has_tag(&mid, PartOfSpeech::ProperNoun).unwrap());
        assert!(!tagger.has_tag(&mid, PartOfSpeech::Noun).unwrap());

        let text = "Bank holidays are fun";
        let start = TokenContext::new(text, 0, 4);
        assert!(tagger.has_tag(&start, PartOfSpeech::Noun).unwrap());
        assert!(!tagger.has_tag(&start, PartOfSpeech::ProperNoun).unwrap());
    }

    #[test]
    fn test_lexicon_tagger_unknown_word_has_no_tags() {
        let tagger = LexiconTagger::new();
        let token = TokenContext::new("a house", 2, 7);
        assert!(!tagger.has_tag(&token, PartOfSpeech::Noun).unwrap());
    }

    #[test]
    fn test_mock_tagger_error_mode() {
        let tagger = MockTagger::new(MockTagMode::Error("model not loaded".to_string()));
        let token = TokenContext::new("a house", 2, 7);
        let err = tagger.has_tag(&token, PartOfSpeech::Noun).unwrap_err();
        assert_eq!(err.to_string(), "Tagger error: model not loaded");
    }
}
