//! Display data for a substituted word
//!
//! When the reader hovers or taps a marker, the host shows a small card with
//! the German word, its article and gender, the English original, an example
//! sentence and a favorite toggle. `Annotation` carries everything that card
//! needs.

use serde::Serialize;
use word_sprinkle::{PartOfSpeech, SubstitutionRecord, VocabularyEntry};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Word as rendered in the text; favorites are keyed by this form
    pub target_word: String,
    /// Original word the marker replaced
    pub source_word: String,
    /// Vocabulary entry behind the substitution, when still indexed
    pub entry: Option<VocabularyEntry>,
    pub is_favorite: bool,
}

/// German and English example sentences
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Example {
    pub german: String,
    pub english: String,
}

impl Annotation {
    pub fn new(record: &SubstitutionRecord, entry: Option<VocabularyEntry>, is_favorite: bool) -> Self {
        Self {
            target_word: record.rendered_text.clone(),
            source_word: record.original_text.clone(),
            entry,
            is_favorite,
        }
    }

    pub fn article(&self) -> Option<&str> {
        self.entry.as_ref()?.article.as_deref()
    }

    pub fn plural(&self) -> Option<&str> {
        self.entry.as_ref()?.plural.as_deref()
    }

    pub fn part_of_speech(&self) -> Option<PartOfSpeech> {
        self.entry.as_ref()?.part_of_speech
    }

    /// Grammatical gender derived from the article
    pub fn gender_label(&self) -> Option<&'static str> {
        match self.article()? {
            "der" => Some("Masculine"),
            "die" => Some("Feminine"),
            "das" => Some("Neuter"),
            _ => None,
        }
    }

    /// First stored example, or a generated "Here is ..." pair
    pub fn example(&self) -> Example {
        if let Some(stored) = self.entry.as_ref().and_then(|e| e.examples.first()) {
            return Example {
                german: stored.clone(),
                english: String::new(),
            };
        }

        let (german, english) = match self.article() {
            Some(article) => (
                format!("Hier ist {} {}.", article, self.target_word),
                format!("Here is the {}.", self.source_word.to_lowercase()),
            ),
            None => (
                format!("Hier ist {}.", self.target_word),
                format!("Here is {}.", self.source_word.to_lowercase()),
            ),
        };
        Example { german, english }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(original: &str, rendered: &str) -> SubstitutionRecord {
        SubstitutionRecord {
            original_text: original.to_string(),
            rendered_text: rendered.to_string(),
            article: None,
            gender: None,
            part_of_speech: None,
        }
    }

    #[test]
    fn test_noun_annotation() {
        let mut entry = VocabularyEntry::new("house", "Haus")
            .with_part_of_speech(PartOfSpeech::Noun)
            .with_article("das");
        entry.plural = Some("Häuser".to_string());
        let annotation = Annotation::new(&record("House", "Haus"), Some(entry), true);

        assert_eq!(annotation.plural(), Some("Häuser"));
        assert_eq!(annotation.gender_label(), Some("Neuter"));
        assert_eq!(annotation.part_of_speech(), Some(PartOfSpeech::Noun));
        assert_eq!(
            annotation.example(),
            Example {
                german: "Hier ist das Haus.".to_string(),
                english: "Here is the house.".to_string(),
            }
        );
        assert!(annotation.is_favorite);
    }

    #[test]
    fn test_gender_labels() {
        for (article, label) in [("der", "Masculine"), ("die", "Feminine"), ("das", "Neuter")] {
            let entry = VocabularyEntry::new("x", "X").with_article(article);
            let annotation = Annotation::new(&record("x", "X"), Some(entry), false);
            assert_eq!(annotation.gender_label(), Some(label));
        }
    }

    #[test]
    fn test_example_without_article() {
        let entry = VocabularyEntry::new("today", "heute");
        let annotation = Annotation::new(&record("Today", "Heute"), Some(entry), false);
        assert_eq!(annotation.gender_label(), None);
        assert_eq!(annotation.example().german, "Hier ist Heute.");
        assert_eq!(annotation.example().english, "Here is today.");
    }

    #[test]
    fn test_stored_example_preferred() {
        let entry = VocabularyEntry::new("book", "Buch").with_example("Ich lese ein Buch.");
        let annotation = Annotation::new(&record("book", "Buch"), Some(entry), false);
        assert_eq!(annotation.example().german, "Ich lese ein Buch.");
    }

    #[test]
    fn test_missing_entry() {
        let annotation = Annotation::new(&record("car", "Auto"), None, false);
        assert_eq!(annotation.article(), None);
        assert_eq!(annotation.example().german, "Hier ist Auto.");
    }
}
