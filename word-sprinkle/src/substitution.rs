//! Applying and reverting substitutions in a content tree
//!
//! A substitution splits a text segment into up to three pieces: the text
//! before the word, a marker node carrying a [`SubstitutionRecord`], and the
//! text after the word. Reverting turns every marker back into a text node
//! holding the original word, so the text of the tree is restored exactly.
//!
//! # Example
//!
//! ```ignore
//! let candidates = scan(&document, &index, None);
//! let selected = select(candidates, 15, &mut rng);
//! let outcome = apply_batch(&mut document, &selected);
//! // ...
//! revert_all(&mut document);
//! ```

use crate::capitalization::render;
use crate::document::{ContentTree, Fragment, NodeId, TreeError};
use crate::scanner::Candidate;
use crate::vocabulary::PartOfSpeech;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// What a marker node remembers about the word it replaced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionRecord {
    /// The source word exactly as it appeared in the text
    pub original_text: String,
    /// The target word as displayed, after capitalization
    pub rendered_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<PartOfSpeech>,
}

impl SubstitutionRecord {
    pub fn for_candidate(candidate: &Candidate) -> Self {
        SubstitutionRecord {
            original_text: candidate.source_word.clone(),
            rendered_text: render(&candidate.entry, &candidate.source_word),
            article: candidate.entry.article.clone(),
            gender: candidate.entry.gender.clone(),
            part_of_speech: candidate.entry.part_of_speech,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubstitutionError {
    /// The segment (or the piece still holding its prefix) has no parent
    Detached(NodeId),
    /// The segment is not a text node
    NotText(NodeId),
    /// The candidate offsets do not fall on the segment's text
    OutOfRange {
        segment: NodeId,
        start: usize,
        end: usize,
    },
    /// The text at the candidate offsets is no longer the matched word
    Mismatch {
        segment: NodeId,
        expected: String,
        found: String,
    },
    Tree(TreeError),
}

impl fmt::Display for SubstitutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubstitutionError::Detached(id) => write!(f, "Segment {} is detached", id),
            SubstitutionError::NotText(id) => write!(f, "Segment {} is not a text node", id),
            SubstitutionError::OutOfRange {
                segment,
                start,
                end,
            } => write!(
                f,
                "Range {}..{} is outside the text of segment {}",
                start, end, segment
            ),
            SubstitutionError::Mismatch {
                segment,
                expected,
                found,
            } => write!(
                f,
                "Segment {} holds '{}' where '{}' was expected",
                segment, found, expected
            ),
            SubstitutionError::Tree(e) => write!(f, "Tree error: {}", e),
        }
    }
}

impl std::error::Error for SubstitutionError {}

impl From<TreeError> for SubstitutionError {
    fn from(e: TreeError) -> Self {
        match e {
            TreeError::Detached(id) => SubstitutionError::Detached(id),
            TreeError::NotText(id) => SubstitutionError::NotText(id),
            other => SubstitutionError::Tree(other),
        }
    }
}

/// A substitution committed to the tree
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub marker: NodeId,
    pub record: SubstitutionRecord,
}

/// Applies candidates to a tree, one batch at a time
///
/// Once a segment has been split, the untouched text before the substituted
/// word lives in a new node. The applier remembers that node so a further
/// candidate of the same segment with a lower offset still finds its word.
#[derive(Debug, Default)]
pub struct Applier {
    prefixes: HashMap<NodeId, NodeId>,
}

impl Applier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply<T>(
        &mut self,
        tree: &mut T,
        candidate: &Candidate,
    ) -> Result<Applied, SubstitutionError>
    where
        T: ContentTree + ?Sized,
    {
        let target = self
            .prefixes
            .get(&candidate.segment)
            .copied()
            .unwrap_or(candidate.segment);

        if tree.parent(target).is_none() {
            return Err(SubstitutionError::Detached(target));
        }
        let text = tree.text(target).ok_or(SubstitutionError::NotText(target))?;
        let found = text
            .get(candidate.start..candidate.end)
            .ok_or(SubstitutionError::OutOfRange {
                segment: target,
                start: candidate.start,
                end: candidate.end,
            })?;
        if found != candidate.source_word {
            return Err(SubstitutionError::Mismatch {
                segment: target,
                expected: candidate.source_word.clone(),
                found: found.to_string(),
            });
        }

        let before = text[..candidate.start].to_string();
        let after = text[candidate.end..].to_string();
        let record = SubstitutionRecord::for_candidate(candidate);

        let mut fragment = Vec::with_capacity(3);
        if !before.is_empty() {
            fragment.push(Fragment::Text(before.clone()));
        }
        fragment.push(Fragment::Marker(record.clone()));
        if !after.is_empty() {
            fragment.push(Fragment::Text(after));
        }

        let inserted = tree.replace_with_fragment(target, fragment)?;
        let marker = if before.is_empty() {
            self.prefixes.remove(&candidate.segment);
            inserted[0]
        } else {
            self.prefixes.insert(candidate.segment, inserted[0]);
            inserted[1]
        };

        debug!(
            "Substituted '{}' with '{}' in segment {}",
            record.original_text, record.rendered_text, candidate.segment
        );
        Ok(Applied { marker, record })
    }
}

/// Result of applying a batch of candidates
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub applied: Vec<Applied>,
    pub failed: Vec<(Candidate, SubstitutionError)>,
}

/// Apply every candidate in order, skipping the ones that fail
pub fn apply_batch<T>(tree: &mut T, candidates: &[Candidate]) -> BatchOutcome
where
    T: ContentTree + ?Sized,
{
    let mut applier = Applier::new();
    let mut outcome = BatchOutcome::default();
    for candidate in candidates {
        match applier.apply(tree, candidate) {
            Ok(applied) => outcome.applied.push(applied),
            Err(e) => {
                warn!("Skipping substitution of '{}': {}", candidate.source_word, e);
                outcome.failed.push((candidate.clone(), e));
            }
        }
    }
    outcome
}

/// Turn every marker back into a text node with its original word.
///
/// Returns the number of markers reverted; a tree without markers is left
/// untouched.
pub fn revert_all<T>(tree: &mut T) -> usize
where
    T: ContentTree + ?Sized,
{
    let mut reverted = 0;
    for marker in tree.markers() {
        let Some(original) = tree.marker(marker).map(|record| record.original_text.clone()) else {
            continue;
        };
        match tree.replace_with_fragment(marker, vec![Fragment::Text(original)]) {
            Ok(_) => reverted += 1,
            Err(e) => warn!("Could not revert marker {}: {}", marker, e),
        }
    }
    reverted
}
