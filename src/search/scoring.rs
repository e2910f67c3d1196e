//! Relevance scoring and canonical-match filtering.
//!
//! Scores are additive integers arranged in tiers. Each tier outweighs every
//! combination of the tiers below it, so an exact citation match always beats
//! an entry that merely mentions the query a lot:
//!
//! | signal                                            | points |
//! |---------------------------------------------------|--------|
//! | title contains query                              | 10     |
//! | each keyword containing query                     | 5      |
//! | description contains query                        | 2      |
//! | marker-style keyword contains query               | 1000   |
//! | entry is source-linked                            | 2000   |
//! | an inherited source name equals the query         | 5000   |
//! | owning section cites one of the query tokens      | 20000  |

use super::index::{EntryKind, SearchableEntry, SectionFacts};
use super::tokenize::{is_marker, marker_eq};

pub(crate) const TITLE_POINTS: u32 = 10;
pub(crate) const KEYWORD_POINTS: u32 = 5;
pub(crate) const DESCRIPTION_POINTS: u32 = 2;
pub(crate) const MARKER_KEYWORD_POINTS: u32 = 1_000;
pub(crate) const SOURCE_LINKED_POINTS: u32 = 2_000;
pub(crate) const SOURCE_NAME_POINTS: u32 = 5_000;
pub(crate) const CITATION_POINTS: u32 = 20_000;

/// Outcome of scoring one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Score {
    pub points: u32,
    /// The owning section's citations named one of the query tokens exactly.
    pub cites_query: bool,
}

/// True when every (lowercased) token occurs somewhere in the entry's title,
/// description, or keywords.
pub fn matches_tokens(entry: &SearchableEntry, tokens: &[String]) -> bool {
    let haystack = format!(
        "{} {} {}",
        entry.title,
        entry.description,
        entry.keywords.join(" ")
    )
    .to_lowercase();

    tokens.iter().all(|token| haystack.contains(token.as_str()))
}

/// True when any citation equals one of the tokens, ignoring case and markers.
pub fn cites_any(sources: &[String], tokens: &[String]) -> bool {
    sources
        .iter()
        .any(|source| tokens.iter().any(|token| marker_eq(source, token)))
}

/// Scores a non-quick-reference entry.
///
/// `raw_query` is matched case-sensitively against raw-cased fields; the
/// citation tiers compare case-insensitively.
pub fn score_entry(
    entry: &SearchableEntry,
    owner: Option<&SectionFacts>,
    raw_query: &str,
    tokens: &[String],
) -> Score {
    let mut points = 0;

    if entry.title.contains(raw_query) {
        points += TITLE_POINTS;
    }

    let matching_keywords = entry.keywords.iter().filter(|k| k.contains(raw_query));
    let mut marker_hit = false;
    for keyword in matching_keywords {
        points += KEYWORD_POINTS;
        marker_hit |= is_marker(keyword);
    }
    // One bonus however many marker keywords match
    if marker_hit {
        points += MARKER_KEYWORD_POINTS;
    }

    if entry.description.contains(raw_query) {
        points += DESCRIPTION_POINTS;
    }

    if entry.is_source_linked {
        points += SOURCE_LINKED_POINTS;
    }

    if entry
        .source_names
        .iter()
        .any(|name| marker_eq(name, raw_query))
    {
        points += SOURCE_NAME_POINTS;
    }

    let cites_query = owner.is_some_and(|section| cites_any(&section.sources, tokens));
    if cites_query {
        points += CITATION_POINTS;
    }

    Score {
        points,
        cites_query,
    }
}

/// Whether an entry is demonstrably authoritative for the query.
pub fn is_canonical(
    entry: &SearchableEntry,
    owner: Option<&SectionFacts>,
    tokens: &[String],
) -> bool {
    match entry.kind {
        EntryKind::Stat => true,
        EntryKind::QuickReference => false,
        EntryKind::CombatAction => owner.is_some_and(|section| {
            section
                .action_names
                .iter()
                .any(|name| name.eq_ignore_ascii_case(&entry.title))
                && cites_any(&section.sources, tokens)
        }),
        _ => owner.is_some_and(|section| {
            section.id == entry.id
                && (cites_any(&section.sources, tokens)
                    || section
                        .content_names
                        .iter()
                        .any(|name| tokens.iter().any(|t| name.to_lowercase() == *t)))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    fn entry(kind: EntryKind, title: &str) -> SearchableEntry {
        SearchableEntry {
            kind,
            category: "combat".to_string(),
            title: title.to_string(),
            description: String::new(),
            keywords: vec![],
            path: "/combat".to_string(),
            section: "Combat".to_string(),
            id: crate::search::tokenize::slugify(title),
            is_quick_reference: kind == EntryKind::QuickReference,
            is_source_linked: matches!(kind, EntryKind::Stat | EntryKind::CombatAction),
            source_names: vec![],
            owner: None,
        }
    }

    fn section(id: &str, sources: &[&str]) -> SectionFacts {
        SectionFacts {
            category: "combat".to_string(),
            id: id.to_string(),
            title: id.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            content_names: vec![],
            action_names: vec![],
        }
    }

    fn tokens(query: &str) -> Vec<String> {
        crate::search::tokenize::query_tokens(query)
    }

    #[rstest]
    #[case("strike", true)]
    #[case("STRIKE heavy", true)]
    #[case("strike missing", false)]
    #[case("weapon", true)]
    fn test_matches_tokens(#[case] query: &str, #[case] expected: bool) {
        let mut e = entry(EntryKind::CombatAction, "Heavy Strike");
        e.keywords = vec!["weapon".to_string()];
        check!(matches_tokens(&e, &tokens(query)) == expected);
    }

    #[test]
    fn test_text_signals_are_case_sensitive() {
        let mut e = entry(EntryKind::DamageType, "Fire");
        e.description = "Fire burns".to_string();
        e.keywords = vec!["Fire".to_string(), "Fireball".to_string(), "@Fire".to_string()];

        let score = score_entry(&e, None, "Fire", &tokens("Fire"));
        check!(
            score.points
                == TITLE_POINTS + 3 * KEYWORD_POINTS + MARKER_KEYWORD_POINTS + DESCRIPTION_POINTS
        );

        let score = score_entry(&e, None, "fire", &tokens("fire"));
        check!(score.points == 0);
    }

    #[test]
    fn test_marker_bonus_counts_once() {
        let mut markers = entry(EntryKind::RuleSection, "Gaze");
        markers.keywords = vec!["@Gaze".to_string(), "%Gaze".to_string()];
        let linked = entry(EntryKind::Stat, "Gaze");

        let marker_score = score_entry(&markers, None, "Gaze", &tokens("Gaze"));
        let linked_score = score_entry(&linked, None, "Gaze", &tokens("Gaze"));

        check!(marker_score.points == TITLE_POINTS + 2 * KEYWORD_POINTS + MARKER_KEYWORD_POINTS);
        check!(linked_score.points > marker_score.points);
    }

    #[test]
    fn test_source_tiers() {
        let mut e = entry(EntryKind::Stat, "Strength");
        e.source_names = vec!["%Strength".to_string()];
        let owner = section("stats", &["%Strength"]);

        let score = score_entry(&e, Some(&owner), "strength", &tokens("strength"));
        check!(score.cites_query);
        check!(score.points == SOURCE_LINKED_POINTS + SOURCE_NAME_POINTS + CITATION_POINTS);
    }

    #[test]
    fn test_citation_match_is_exact_not_substring() {
        let owner = section("stats", &["Strength"]);
        let e = entry(EntryKind::RuleSection, "Stats");
        check!(!score_entry(&e, Some(&owner), "Str", &tokens("Str")).cites_query);
    }

    #[test]
    fn test_tier_ordering() {
        check!(
            CITATION_POINTS > SOURCE_NAME_POINTS + SOURCE_LINKED_POINTS + MARKER_KEYWORD_POINTS
        );
        check!(SOURCE_NAME_POINTS > SOURCE_LINKED_POINTS + MARKER_KEYWORD_POINTS);
        check!(SOURCE_LINKED_POINTS > MARKER_KEYWORD_POINTS);
        check!(TITLE_POINTS > KEYWORD_POINTS && KEYWORD_POINTS > DESCRIPTION_POINTS);
    }

    #[test]
    fn test_canonical_by_kind() {
        let t = tokens("dodge");

        check!(is_canonical(&entry(EntryKind::Stat, "Luck"), None, &t));
        check!(!is_canonical(&entry(EntryKind::QuickReference, "Dodge"), None, &t));

        let mut actions = section("movement", &["Dodge"]);
        actions.action_names = vec!["Dodge".to_string()];
        check!(is_canonical(&entry(EntryKind::CombatAction, "Dodge"), Some(&actions), &t));
        check!(!is_canonical(&entry(EntryKind::CombatAction, "Dash"), Some(&actions), &t));
        check!(!is_canonical(
            &entry(EntryKind::CombatAction, "Dodge"),
            Some(&actions),
            &tokens("dodg")
        ));

        let cited = section("dodge", &["Dodge"]);
        check!(is_canonical(&entry(EntryKind::RuleSection, "Dodge"), Some(&cited), &t));
        let other = section("movement", &["Dodge"]);
        check!(!is_canonical(&entry(EntryKind::RuleSection, "Dodge"), Some(&other), &t));
    }

    #[test]
    fn test_canonical_via_content_name() {
        let mut owner = section("luck", &[]);
        owner.content_names = vec!["Luck".to_string()];
        let e = entry(EntryKind::RuleSection, "Luck");
        check!(is_canonical(&e, Some(&owner), &tokens("luck")));
        check!(!is_canonical(&e, Some(&owner), &tokens("lucky")));
    }
}
