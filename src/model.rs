//! Input document shapes consumed by the indexer.
//!
//! These mirror the JSON rule files on disk. Every optional field degrades to an
//! empty default, including explicit `null`s, so a malformed-but-present document
//! never fails to deserialize over a missing field.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// Deserialize `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One rule document per category (e.g. `combat`, `character-creation`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// `None` means the document carries no sections at all; the indexer skips it.
    #[serde(default)]
    pub sections: Option<Vec<Section>>,
}

/// A section of a rule document. Subsections share the same shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Section {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
    /// Names this section is the rules authority for.
    #[serde(rename = "%Source", alias = "sources", deserialize_with = "null_as_default")]
    pub sources: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub subsections: Vec<Section>,
    /// Stat content.
    #[serde(deserialize_with = "null_as_default")]
    pub content: Vec<RuleItem>,
    #[serde(alias = "combatActions", deserialize_with = "null_as_default")]
    pub actions: Vec<RuleItem>,
    #[serde(alias = "damageTypes", deserialize_with = "null_as_default")]
    pub damage_types: Vec<RuleItem>,
    #[serde(alias = "statusConditions", alias = "conditions", deserialize_with = "null_as_default")]
    pub status_conditions: Vec<RuleItem>,
    #[serde(alias = "equipmentRules", deserialize_with = "null_as_default")]
    pub equipment_rules: Vec<RuleItem>,
    #[serde(alias = "huntPhases", deserialize_with = "null_as_default")]
    pub phases: Vec<RuleItem>,
}

/// A named item inside one of a section's domain arrays.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuleItem {
    #[serde(alias = "title", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
}

/// A condensed cheat-sheet item. The display title comes from whichever of
/// `term`, `stat`, or `type` is present, in that order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuickReferenceItem {
    pub term: Option<String>,
    pub stat: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub uses: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub examples: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub effective_against: Vec<String>,
}

impl QuickReferenceItem {
    /// First non-blank of `term`, `stat`, `type`.
    pub fn title(&self) -> Option<&str> {
        [&self.term, &self.stat, &self.kind]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .find(|value| !value.trim().is_empty())
    }
}

/// An explicit reference-id registration (`@Body` → where it lives).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReferenceIdEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub category: String,
    pub section: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
}

/// The complete, immutable document set an index is built from.
///
/// Maps are ordered so the derived entry list is deterministic.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub documents: BTreeMap<String, RuleDocument>,
    pub quick_reference: BTreeMap<String, Vec<QuickReferenceItem>>,
    pub reference_ids: BTreeMap<String, ReferenceIdEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};

    #[test]
    fn test_missing_and_null_fields_default() {
        let json = r#"{
            "title": "Combat",
            "sections": [
                { "id": "attacks", "title": "Attacks", "keywords": null, "%Source": ["Strike"] }
            ]
        }"#;
        let doc: RuleDocument = serde_json::from_str(json).unwrap();
        let_assert!(Some(sections) = doc.sections);
        check!(sections.len() == 1);
        check!(sections[0].keywords.is_empty());
        check!(sections[0].description.is_empty());
        check!(sections[0].sources == vec!["Strike".to_string()]);
    }

    #[test]
    fn test_document_without_sections() {
        let doc: RuleDocument = serde_json::from_str(r#"{ "title": "Empty" }"#).unwrap();
        check!(doc.sections.is_none());
    }

    #[test]
    fn test_item_accepts_title_alias() {
        let item: RuleItem =
            serde_json::from_str(r#"{ "title": "Bleeding", "description": "Lose blood" }"#)
                .unwrap();
        check!(item.name == "Bleeding");
    }

    #[test]
    fn test_quick_reference_title_precedence() {
        let item: QuickReferenceItem =
            serde_json::from_str(r#"{ "stat": "Speed", "type": "Movement" }"#).unwrap();
        check!(item.title() == Some("Speed"));

        let item: QuickReferenceItem =
            serde_json::from_str(r#"{ "term": "  ", "type": "Movement" }"#).unwrap();
        check!(item.title() == Some("Movement"));

        let item: QuickReferenceItem = serde_json::from_str(r#"{ "uses": ["x"] }"#).unwrap();
        check!(item.title().is_none());
    }
}
