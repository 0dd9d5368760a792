use crate::vocabulary::{Level, Vocabulary, VocabularyEntry};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Load one vocabulary tier from a JSON file
///
/// The JSON file should be an array of entries:
/// ```json
/// [
///     {"source": "house", "target": "Haus", "partOfSpeech": "noun", "article": "das"},
///     {"source": "today", "target": "heute", "partOfSpeech": "adverb"}
/// ]
/// ```
///
/// Entries that fail to deserialize are skipped with a warning rather than
/// failing the whole tier.
///
/// # Errors
/// - File not found
/// - Invalid JSON
/// - Root is not an array
pub fn load_tier_from_file(path: &Path) -> Result<Vec<VocabularyEntry>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read file '{}': {}", path.display(), e))?;

    let json: Value = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse JSON from '{}': {}", path.display(), e))?;

    let items = json.as_array().ok_or_else(|| {
        format!(
            "Invalid JSON in '{}': root must be an array",
            path.display()
        )
    })?;

    let mut entries = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        match serde_json::from_value::<VocabularyEntry>(item.clone()) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(
                "Entry {} in '{}' is not a valid vocabulary entry, skipping: {}",
                position,
                path.display(),
                e
            ),
        }
    }

    Ok(entries)
}

/// Load all tiers from a directory
///
/// The directory is expected to hold `a1.json`, `a2.json`, `b1.json` and
/// `b2.json`. A missing tier file leaves that tier empty.
///
/// # Errors
/// - Directory not found
/// - File read/parse errors
pub fn load_vocabulary_from_dir(dir: &Path) -> Result<Vocabulary, String> {
    if !dir.exists() {
        return Err(format!("Directory not found: {}", dir.display()));
    }

    if !dir.is_dir() {
        return Err(format!("Path is not a directory: {}", dir.display()));
    }

    let mut vocabulary = Vocabulary::new();
    for level in Level::ALL {
        let path = dir.join(format!("{}.json", level.as_str().to_lowercase()));
        if !path.exists() {
            warn!("No vocabulary file for tier {} at {}", level, path.display());
            continue;
        }
        vocabulary.with_tier(level, load_tier_from_file(&path)?);
    }

    if vocabulary.is_empty() {
        warn!("No vocabulary entries found in directory {}", dir.display());
    }

    Ok(vocabulary)
}
