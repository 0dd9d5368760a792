//! Locating eligible vocabulary words in a content tree
//!
//! The scanner walks the tree in document order, collects prose text
//! segments, and reports every whole-word vocabulary match with its byte
//! offsets inside the segment. When a [`ContextTagger`] is supplied, matches
//! whose entry declares a part of speech are additionally checked against the
//! token's grammatical context.

use crate::document::{ContentTree, NodeId, NodeKind};
use crate::index::VocabularyIndex;
use crate::tagger::{ContextTagger, TagError, TokenContext};
use crate::vocabulary::{PartOfSpeech, VocabularyEntry};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Elements whose content is never prose
pub const SKIP_TAGS: [&str; 18] = [
    "script", "style", "noscript", "iframe", "object", "embed", "input", "textarea", "select",
    "button", "code", "pre", "svg", "canvas", "video", "audio", "head", "title",
];

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Alphabetic}+").expect("word pattern is valid"));

/// A located, eligible match within one text segment
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub segment: NodeId,
    /// Byte offset of the first character of the word
    pub start: usize,
    /// Byte offset one past the last character of the word
    pub end: usize,
    /// The word exactly as it appears in the text
    pub source_word: String,
    pub entry: VocabularyEntry,
}

/// Whether `c` may sit next to a word without joining it.
///
/// `None` stands for the edge of the segment.
pub fn is_boundary(c: Option<char>) -> bool {
    match c {
        None => true,
        Some(c) => !(c.is_alphanumeric() || c == '_'),
    }
}

fn is_skipped_tag(tag: &str) -> bool {
    SKIP_TAGS.iter().any(|skip| skip.eq_ignore_ascii_case(tag))
}

/// Find every eligible candidate in `tree`.
///
/// Without a tagger only the boundary rule applies. If the tagger fails on
/// any token the grammatical gate is dropped for the whole scan.
pub fn scan<T>(
    tree: &T,
    index: &VocabularyIndex,
    tagger: Option<&dyn ContextTagger>,
) -> Vec<Candidate>
where
    T: ContentTree + ?Sized,
{
    let mut segments = Vec::new();
    collect_segments(tree, tree.root(), &mut segments);

    let matches: Vec<Candidate> = segments
        .iter()
        .flat_map(|segment| boundary_matches(tree, *segment, index))
        .collect();
    debug!(
        "Scanned {} segments, {} boundary matches",
        segments.len(),
        matches.len()
    );

    let Some(tagger) = tagger else {
        return matches;
    };

    match context_gate(tree, &matches, tagger) {
        Ok(kept) => {
            debug!(
                "{} kept {} of {} matches",
                tagger.tagger_name(),
                kept.len(),
                matches.len()
            );
            kept
        }
        Err(e) => {
            warn!(
                "{} failed, falling back to boundary-only matching: {}",
                tagger.tagger_name(),
                e
            );
            matches
        }
    }
}

/// Text segments eligible for substitution, in document order
fn collect_segments<T>(tree: &T, node: NodeId, out: &mut Vec<NodeId>)
where
    T: ContentTree + ?Sized,
{
    match tree.kind(node) {
        Some(NodeKind::Element { tag, editable }) => {
            if editable || is_skipped_tag(tag) {
                return;
            }
            for child in tree.children(node) {
                collect_segments(tree, child, out);
            }
        }
        Some(NodeKind::Text) => {
            if tree.text(node).is_some_and(|text| !text.trim().is_empty()) {
                out.push(node);
            }
        }
        Some(NodeKind::Marker) | None => {}
    }
}

fn boundary_matches<T>(tree: &T, segment: NodeId, index: &VocabularyIndex) -> Vec<Candidate>
where
    T: ContentTree + ?Sized,
{
    let Some(text) = tree.text(segment) else {
        return Vec::new();
    };

    WORD_PATTERN
        .find_iter(text)
        .filter_map(|found| {
            let entry = index.get(found.as_str())?;
            let before = text[..found.start()].chars().next_back();
            let after = text[found.end()..].chars().next();
            if !(is_boundary(before) && is_boundary(after)) {
                return None;
            }
            Some(Candidate {
                segment,
                start: found.start(),
                end: found.end(),
                source_word: found.as_str().to_string(),
                entry: entry.clone(),
            })
        })
        .collect()
}

fn context_gate<T>(
    tree: &T,
    matches: &[Candidate],
    tagger: &dyn ContextTagger,
) -> Result<Vec<Candidate>, TagError>
where
    T: ContentTree + ?Sized,
{
    let mut kept = Vec::with_capacity(matches.len());
    for candidate in matches {
        let Some(declared) = candidate.entry.part_of_speech else {
            kept.push(candidate.clone());
            continue;
        };
        let Some(text) = tree.text(candidate.segment) else {
            continue;
        };
        let token = TokenContext::new(text, candidate.start, candidate.end);

        if !tagger.has_tag(&token, declared)? {
            continue;
        }
        if declared != PartOfSpeech::ProperNoun
            && tagger.has_tag(&token, PartOfSpeech::ProperNoun)?
        {
            continue;
        }
        kept.push(candidate.clone());
    }
    Ok(kept)
}
