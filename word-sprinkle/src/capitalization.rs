use crate::vocabulary::VocabularyEntry;

/// Uppercase the first character of `word`, leaving the rest untouched
pub fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Target word with German casing for the matched source word.
///
/// German nouns are always capitalized. Any other word is capitalized when the
/// matched English word was (sentence starts, headings), and otherwise keeps
/// the casing stored in the vocabulary.
pub fn render(entry: &VocabularyEntry, matched: &str) -> String {
    if entry.is_noun() {
        return capitalize_first(&entry.target);
    }
    if matched.chars().next().is_some_and(char::is_uppercase) {
        return capitalize_first(&entry.target);
    }
    entry.target.clone()
}
