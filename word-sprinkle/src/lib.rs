//! Sprinkle foreign-language vocabulary into running text
//!
//! Given a content tree and a leveled English → German vocabulary, this crate
//! finds whole-word matches, samples a share of them, renders each target word
//! with German capitalization, and substitutes it in place behind a marker that
//! remembers the original word so the change can be undone exactly.
//!
//! # Example
//!
//! ```ignore
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use word_sprinkle::{Document, Level, Vocabulary, VocabularyIndex};
//! use word_sprinkle::{apply_batch, revert_all, scan, select};
//!
//! let vocabulary = Vocabulary::builtin()?;
//! let index = VocabularyIndex::build(&vocabulary, Level::B1);
//! let mut document = Document::from_plain_text("I see a house today.");
//!
//! let candidates = scan(&document, &index, None);
//! let selected = select(candidates, 100, &mut StdRng::seed_from_u64(1));
//! apply_batch(&mut document, &selected);
//! assert_eq!(document.text_content(), "I sehen a Haus heute.");
//!
//! revert_all(&mut document);
//! assert_eq!(document.text_content(), "I see a house today.");
//! ```

pub mod capitalization;
pub mod document;
pub mod index;
pub mod loader;
pub mod sampler;
pub mod scanner;
pub mod substitution;
pub mod tagger;
pub mod vocabulary;

pub use capitalization::{capitalize_first, render};
pub use document::{
    ContentTree, Document, Fragment, MARKER_CLASS, NodeId, NodeKind, Outline, TreeError,
    is_valid_tag,
};
pub use index::VocabularyIndex;
pub use loader::{load_tier_from_file, load_vocabulary_from_dir};
pub use sampler::{select, selection_count};
pub use scanner::{Candidate, is_boundary, scan};
pub use substitution::{
    Applied, Applier, BatchOutcome, SubstitutionError, SubstitutionRecord, apply_batch, revert_all,
};
pub use tagger::{ContextTagger, LexiconTagger, MockTagMode, MockTagger, TagError, TokenContext};
pub use vocabulary::{Level, PartOfSpeech, Vocabulary, VocabularyEntry};
