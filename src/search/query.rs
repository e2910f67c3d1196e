//! Query execution: scoring, canonical filtering, ordering, and fallback.

use super::index::{EntryKind, RuleIndex, SearchableEntry};
use super::scoring::{Score, is_canonical, matches_tokens, score_entry};
use super::tokenize::query_tokens;
use serde::Serialize;
use std::cmp::Ordering;

/// A ranked search hit as handed to presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub title: String,
    pub description: String,
    pub path: String,
    pub section: String,
    pub id: String,
    pub relevance_score: u32,
}

impl SearchResult {
    fn from_scored(scored: &Scored<'_>) -> Self {
        let entry = scored.entry;
        Self {
            kind: entry.kind.as_str().to_string(),
            category: entry.category.clone(),
            title: entry.title.clone(),
            description: entry.description.clone(),
            path: entry.path.clone(),
            section: entry.section.clone(),
            id: entry.id.clone(),
            relevance_score: scored.score.points,
        }
    }
}

/// An entry paired with its score for one query.
#[derive(Debug, Clone, Copy)]
struct Scored<'a> {
    /// Position in the index's entry list; identifies the entry.
    position: usize,
    entry: &'a SearchableEntry,
    score: Score,
}

/// Score descending, then title ascending.
fn by_rank(a: &Scored<'_>, b: &Scored<'_>) -> Ordering {
    b.score
        .points
        .cmp(&a.score.points)
        .then_with(|| a.entry.title.cmp(&b.entry.title))
}

/// Runs queries against a built [`RuleIndex`].
#[derive(Debug, Clone, Copy)]
pub struct SearchEngine<'a> {
    index: &'a RuleIndex,
}

impl<'a> SearchEngine<'a> {
    pub const fn new(index: &'a RuleIndex) -> Self {
        Self { index }
    }

    /// Searches with the index's configured result limit.
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        self.search_with_limit(query, self.index.options().result_limit)
    }

    /// Searches, returning at most `limit` results (never more than the index limit).
    ///
    /// Only canonical matches are returned when any exist. When none do, the
    /// closest substring matches are returned instead, so a query that matches
    /// anything at all never comes back empty.
    pub fn search_with_limit(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        let tokens = query_tokens(query);
        if tokens.is_empty() {
            return vec![];
        }

        let limit = limit.clamp(1, self.index.options().result_limit);
        let raw_query = query.trim();
        let entries = self.index.entries();

        let mut pool: Vec<Scored<'a>> = Vec::new();
        let mut canonical_stat: Option<usize> = None;

        // Pass 1: everything but quick-reference entries gets a real score.
        for (position, entry) in entries.iter().enumerate() {
            if entry.is_quick_reference || !matches_tokens(entry, &tokens) {
                continue;
            }

            let score = score_entry(entry, self.index.owner_of(entry), raw_query, &tokens);
            if score.cites_query
                && entry.kind == EntryKind::Stat
                && entry.category == self.index.options().character_creation_category
                && canonical_stat.is_none()
            {
                canonical_stat = Some(position);
            }

            pool.push(Scored {
                position,
                entry,
                score,
            });
        }

        // Pass 2: quick-reference entries only ever compete in the fallback.
        for (position, entry) in entries.iter().enumerate() {
            if entry.is_quick_reference && matches_tokens(entry, &tokens) {
                pool.push(Scored {
                    position,
                    entry,
                    score: Score::default(),
                });
            }
        }

        let mut canonical: Vec<Scored<'a>> = pool
            .iter()
            .filter(|s| is_canonical(s.entry, self.index.owner_of(s.entry), &tokens))
            .copied()
            .collect();

        if canonical.is_empty() {
            tracing::debug!(
                "No canonical match for '{}', falling back to {} substring matches",
                raw_query,
                pool.len()
            );
            return Self::fallback(pool, limit);
        }

        canonical.sort_by(by_rank);

        if let Some(winner) = canonical_stat
            && let Some(at) = canonical.iter().position(|s| s.position == winner)
        {
            let promoted = canonical.remove(at);
            canonical.insert(0, promoted);
        }

        canonical
            .iter()
            .take(limit)
            .map(SearchResult::from_scored)
            .collect()
    }

    /// Ranks the whole scored pool, preferring non-quick-reference entries.
    fn fallback(pool: Vec<Scored<'a>>, limit: usize) -> Vec<SearchResult> {
        let (mut primary, quick): (Vec<_>, Vec<_>) =
            pool.into_iter().partition(|s| !s.entry.is_quick_reference);

        if primary.is_empty() {
            primary = quick;
        }

        primary.sort_by(by_rank);
        primary
            .iter()
            .take(limit)
            .map(SearchResult::from_scored)
            .collect()
    }
}

impl RuleIndex {
    /// Shorthand for [`SearchEngine::search`].
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        SearchEngine::new(self).search(query)
    }
}
