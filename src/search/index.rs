//! Flattens category rule documents into one searchable entry list.
//!
//! The result is an immutable [`RuleIndex`]: every change to the source documents
//! builds a fresh one from scratch.

use crate::model::{QuickReferenceItem, RuleDocument, RuleItem, RuleSet, Section};
use crate::resolve::ReferenceResolver;
use ahash::AHashSet;
use serde::Serialize;
use std::fmt;

use super::tokenize::slugify;

/// Default category whose citation winners are promoted to the top of results.
pub const DEFAULT_CHARACTER_CREATION_CATEGORY: &str = "character-creation";

/// Upper bound on results returned by a single search.
pub const MAX_RESULTS: usize = 20;

/// Section label used for quick-reference entries.
const QUICK_REFERENCE_LABEL: &str = "Quick Reference";

/// What kind of content an entry was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    QuickReference,
    RuleSection,
    RuleSubsection,
    Stat,
    CombatAction,
    DamageType,
    StatusCondition,
    EquipmentRule,
    HuntPhase,
}

impl EntryKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QuickReference => "quick-reference",
            Self::RuleSection => "rule-section",
            Self::RuleSubsection => "rule-subsection",
            Self::Stat => "stat",
            Self::CombatAction => "combat-action",
            Self::DamageType => "damage-type",
            Self::StatusCondition => "status-condition",
            Self::EquipmentRule => "equipment-rule",
            Self::HuntPhase => "hunt-phase",
        }
    }

    /// Items that inherit their owning section's citations.
    const fn is_source_linked(self) -> bool {
        matches!(self, Self::Stat | Self::CombatAction)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One flat, searchable unit of rules content.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchableEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub category: String,
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub path: String,
    /// Label of the section the entry lives under.
    pub section: String,
    pub id: String,
    pub is_quick_reference: bool,
    pub is_source_linked: bool,
    /// Citation list inherited from the owning section (source-linked entries only).
    pub source_names: Vec<String>,
    /// Index into [`RuleIndex::sections`] of the owning section.
    #[serde(skip)]
    pub(crate) owner: Option<usize>,
}

/// The facts about a section that ranking and filtering consult.
#[derive(Debug, Clone)]
pub struct SectionFacts {
    pub category: String,
    pub id: String,
    pub title: String,
    /// Deduplicated citation list.
    pub sources: Vec<String>,
    /// Names of the section's stat content items.
    pub content_names: Vec<String>,
    /// Names of the section's combat actions.
    pub action_names: Vec<String>,
}

/// Knobs that change ranking behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOptions {
    /// Category whose exact-citation matches are promoted to the first result.
    pub character_creation_category: String,
    /// Maximum results per search, clamped to `1..=MAX_RESULTS`.
    pub result_limit: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            character_creation_category: DEFAULT_CHARACTER_CREATION_CATEGORY.to_string(),
            result_limit: MAX_RESULTS,
        }
    }
}

/// Removes duplicate citations case-insensitively, keeping first-seen order and casing.
pub fn dedup_sources(sources: &[String]) -> Vec<String> {
    let mut seen = AHashSet::with_capacity(sources.len());
    sources
        .iter()
        .filter(|source| seen.insert(source.to_lowercase()))
        .cloned()
        .collect()
}

/// Deduplicates every citation list in a section tree, in place.
pub fn dedup_citations(sections: &mut [Section]) {
    for section in sections {
        section.sources = dedup_sources(&section.sources);
        dedup_citations(&mut section.subsections);
    }
}

/// Accumulates entries and section facts for one rebuild.
#[derive(Default)]
pub(crate) struct ContentIndexer {
    entries: Vec<SearchableEntry>,
    sections: Vec<SectionFacts>,
    skipped_documents: usize,
}

impl ContentIndexer {
    /// Index one category: its quick-reference items first, then its sections.
    pub(crate) fn index_category(
        &mut self,
        category: &str,
        document: Option<&RuleDocument>,
        quick_reference: &[QuickReferenceItem],
    ) {
        for item in quick_reference {
            self.add_quick_reference(category, item);
        }

        let Some(document) = document else {
            return;
        };
        let Some(sections) = &document.sections else {
            tracing::debug!("Skipping category '{}': document has no sections", category);
            self.skipped_documents += 1;
            return;
        };

        let mut sections = sections.clone();
        dedup_citations(&mut sections);

        for section in &sections {
            self.recurse(category, section, None);
        }
    }

    fn add_quick_reference(&mut self, category: &str, item: &QuickReferenceItem) {
        let Some(title) = item.title() else {
            tracing::trace!("Skipping untitled quick-reference item in '{}'", category);
            return;
        };

        self.entries.push(SearchableEntry {
            kind: EntryKind::QuickReference,
            category: category.to_string(),
            title: title.to_string(),
            description: item.description.clone(),
            keywords: item.keywords.clone(),
            path: format!("/{}", category),
            section: QUICK_REFERENCE_LABEL.to_string(),
            id: slugify(title),
            is_quick_reference: true,
            is_source_linked: false,
            source_names: Vec::new(),
            owner: None,
        });
    }

    /// Index a section (or, when `parent` is set, a subsection) and everything under it.
    fn recurse(&mut self, category: &str, section: &Section, parent: Option<&Section>) {
        let owner = self.sections.len();
        self.sections.push(SectionFacts {
            category: category.to_string(),
            id: section.id.clone(),
            title: section.title.clone(),
            sources: section.sources.clone(),
            content_names: section.content.iter().map(|i| i.name.clone()).collect(),
            action_names: section.actions.iter().map(|i| i.name.clone()).collect(),
        });

        let (kind, path, label) = match parent {
            None => (
                EntryKind::RuleSection,
                format!("/{}#{}", category, section.id),
                &section.title,
            ),
            // Subsections have no anchor of their own.
            Some(parent) => (
                EntryKind::RuleSubsection,
                format!("/{}", category),
                &parent.title,
            ),
        };

        if section.title.trim().is_empty() {
            tracing::trace!("Skipping untitled section '{}' in '{}'", section.id, category);
        } else {
            self.entries.push(SearchableEntry {
                kind,
                category: category.to_string(),
                title: section.title.clone(),
                description: section.description.clone(),
                keywords: section.keywords.clone(),
                path,
                section: label.clone(),
                id: section.id.clone(),
                is_quick_reference: false,
                is_source_linked: false,
                source_names: Vec::new(),
                owner: Some(owner),
            });
        }

        let item_groups: [(&[RuleItem], EntryKind); 6] = [
            (section.content.as_slice(), EntryKind::Stat),
            (section.actions.as_slice(), EntryKind::CombatAction),
            (section.damage_types.as_slice(), EntryKind::DamageType),
            (section.status_conditions.as_slice(), EntryKind::StatusCondition),
            (section.equipment_rules.as_slice(), EntryKind::EquipmentRule),
            (section.phases.as_slice(), EntryKind::HuntPhase),
        ];
        for (items, kind) in item_groups {
            for item in items {
                self.add_item(category, section, owner, item, kind);
            }
        }

        for subsection in &section.subsections {
            self.recurse(category, subsection, Some(section));
        }
    }

    fn add_item(
        &mut self,
        category: &str,
        section: &Section,
        owner: usize,
        item: &RuleItem,
        kind: EntryKind,
    ) {
        if item.name.trim().is_empty() {
            tracing::trace!("Skipping unnamed {} in section '{}'", kind, section.id);
            return;
        }

        let source_linked = kind.is_source_linked();
        self.entries.push(SearchableEntry {
            kind,
            category: category.to_string(),
            title: item.name.clone(),
            description: item.description.clone(),
            keywords: item.keywords.clone(),
            path: format!("/{}", category),
            section: section.title.clone(),
            id: slugify(&item.name),
            is_quick_reference: false,
            is_source_linked: source_linked,
            source_names: if source_linked {
                section.sources.clone()
            } else {
                Vec::new()
            },
            owner: Some(owner),
        });
    }
}

/// A fully built, immutable search corpus plus its reference lookup.
#[derive(Debug, Clone)]
pub struct RuleIndex {
    entries: Vec<SearchableEntry>,
    sections: Vec<SectionFacts>,
    resolver: ReferenceResolver,
    options: IndexOptions,
}

impl RuleIndex {
    /// Builds entries and the resolver from a complete document set.
    ///
    /// Categories are visited in name order; a category present only in the
    /// quick-reference table still contributes its quick-reference entries.
    pub fn build(rules: &RuleSet, options: IndexOptions) -> Self {
        let start = std::time::Instant::now();
        let mut indexer = ContentIndexer::default();

        let categories: std::collections::BTreeSet<&String> = rules
            .documents
            .keys()
            .chain(rules.quick_reference.keys())
            .collect();

        for category in categories {
            indexer.index_category(
                category,
                rules.documents.get(category),
                rules
                    .quick_reference
                    .get(category)
                    .map_or(&[][..], Vec::as_slice),
            );
        }

        let resolver = ReferenceResolver::build(&indexer.entries, &rules.reference_ids);

        tracing::info!(
            "Built rule index: {} entries, {} sections, {} reference keys ({} documents skipped) in {:?}",
            indexer.entries.len(),
            indexer.sections.len(),
            resolver.len(),
            indexer.skipped_documents,
            start.elapsed()
        );

        let options = IndexOptions {
            result_limit: options.result_limit.clamp(1, MAX_RESULTS),
            ..options
        };

        Self {
            entries: indexer.entries,
            sections: indexer.sections,
            resolver,
            options,
        }
    }

    pub fn entries(&self) -> &[SearchableEntry] {
        &self.entries
    }

    pub fn resolver(&self) -> &ReferenceResolver {
        &self.resolver
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// The section an entry was derived from, if any.
    pub fn owner_of(&self, entry: &SearchableEntry) -> Option<&SectionFacts> {
        entry.owner.and_then(|idx| self.sections.get(idx))
    }

    /// Looks up a section or subsection by category and id.
    pub fn section(&self, category: &str, id: &str) -> Option<&SectionFacts> {
        self.sections
            .iter()
            .find(|s| s.category == category && s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReferenceIdEntry;
    use assert2::{check, let_assert};

    fn item(name: &str) -> RuleItem {
        RuleItem {
            name: name.to_string(),
            description: format!("{} description", name),
            keywords: vec![],
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn sample_rules() -> RuleSet {
        let mut rules = RuleSet::default();
        rules.documents.insert(
            "character-creation".to_string(),
            RuleDocument {
                title: "Character Creation".to_string(),
                sections: Some(vec![Section {
                    id: "stats".to_string(),
                    title: "Stats".to_string(),
                    description: "Core attributes".to_string(),
                    sources: strings(&["Ash", "ash", "Ember"]),
                    content: vec![item("Lantern Hook")],
                    subsections: vec![Section {
                        id: "derived".to_string(),
                        title: "Derived Stats".to_string(),
                        sources: strings(&["Speed", "SPEED"]),
                        phases: vec![item("Showdown")],
                        ..Section::default()
                    }],
                    ..Section::default()
                }]),
            },
        );
        rules.documents.insert(
            "lore".to_string(),
            RuleDocument {
                title: "Lore".to_string(),
                sections: None,
            },
        );
        rules.quick_reference.insert(
            "glossary".to_string(),
            vec![QuickReferenceItem {
                term: Some("Evasion".to_string()),
                description: "Chance to avoid".to_string(),
                ..QuickReferenceItem::default()
            }],
        );
        rules.reference_ids.insert(
            "@Ash".to_string(),
            ReferenceIdEntry {
                category: "character-creation".to_string(),
                section: Some("stats".to_string()),
                description: "Ash stat".to_string(),
                title: "Ash".to_string(),
            },
        );
        rules
    }

    #[test]
    fn test_dedup_sources_keeps_first_seen() {
        check!(dedup_sources(&strings(&["Ash", "ash", "Ember"])) == strings(&["Ash", "Ember"]));
        check!(dedup_sources(&strings(&["b", "A", "a", "B"])) == strings(&["b", "A"]));
        check!(dedup_sources(&[]).is_empty());
    }

    #[test]
    fn test_dedup_citations_recurses() {
        let mut sections = vec![Section {
            sources: strings(&["X", "x"]),
            subsections: vec![Section {
                sources: strings(&["Y", "y", "Z"]),
                ..Section::default()
            }],
            ..Section::default()
        }];
        dedup_citations(&mut sections);
        check!(sections[0].sources == strings(&["X"]));
        check!(sections[0].subsections[0].sources == strings(&["Y", "Z"]));
    }

    #[test]
    fn test_entry_derivation() {
        let index = RuleIndex::build(&sample_rules(), IndexOptions::default());
        let kinds: Vec<(EntryKind, &str)> = index
            .entries()
            .iter()
            .map(|e| (e.kind, e.title.as_str()))
            .collect();

        check!(
            kinds
                == vec![
                    (EntryKind::RuleSection, "Stats"),
                    (EntryKind::Stat, "Lantern Hook"),
                    (EntryKind::RuleSubsection, "Derived Stats"),
                    (EntryKind::HuntPhase, "Showdown"),
                    (EntryKind::QuickReference, "Evasion"),
                ]
        );
    }

    #[test]
    fn test_paths_and_ids() {
        let index = RuleIndex::build(&sample_rules(), IndexOptions::default());
        let entries = index.entries();

        check!(entries[0].path == "/character-creation#stats");
        check!(entries[0].section == "Stats");
        check!(entries[1].id == "lantern-hook");
        check!(entries[1].path == "/character-creation");
        check!(entries[2].path == "/character-creation");
        check!(entries[2].section == "Stats");
        check!(entries[4].path == "/glossary");
        check!(entries[4].is_quick_reference);
    }

    #[test]
    fn test_stat_inherits_deduped_sources() {
        let index = RuleIndex::build(&sample_rules(), IndexOptions::default());
        let stat = &index.entries()[1];
        check!(stat.is_source_linked);
        check!(stat.source_names == strings(&["Ash", "Ember"]));

        let phase = &index.entries()[3];
        check!(!phase.is_source_linked);
        check!(phase.source_names.is_empty());

        let_assert!(Some(owner) = index.owner_of(phase));
        check!(owner.id == "derived");
        check!(owner.sources == strings(&["Speed"]));
    }

    #[test]
    fn test_document_without_sections_is_skipped() {
        let index = RuleIndex::build(&sample_rules(), IndexOptions::default());
        check!(index.entries().iter().all(|e| e.category != "lore"));
    }

    #[test]
    fn test_section_lookup() {
        let index = RuleIndex::build(&sample_rules(), IndexOptions::default());
        let_assert!(Some(section) = index.section("character-creation", "derived"));
        check!(section.title == "Derived Stats");
        check!(index.section("character-creation", "missing").is_none());
    }

    #[test]
    fn test_result_limit_is_clamped() {
        let options = IndexOptions {
            result_limit: 500,
            ..IndexOptions::default()
        };
        let index = RuleIndex::build(&RuleSet::default(), options);
        check!(index.options().result_limit == MAX_RESULTS);
        check!(index.entries().is_empty());
    }
}
