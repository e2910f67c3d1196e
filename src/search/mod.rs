//! Rules search: flattening documents into entries, scoring, and ranking.
//!
//! The whole module is synchronous and side-effect free. A [`RuleIndex`] is built
//! once per document set and then queried concurrently through shared references.

pub(crate) mod index;
pub(crate) mod query;
pub(crate) mod scoring;
pub(crate) mod tokenize;

pub use index::{
    DEFAULT_CHARACTER_CREATION_CATEGORY, EntryKind, IndexOptions, MAX_RESULTS, RuleIndex,
    SearchableEntry, SectionFacts, dedup_citations, dedup_sources,
};
pub use query::{SearchEngine, SearchResult};
pub use tokenize::{query_tokens, slugify, strip_marker};
