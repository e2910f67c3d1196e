//! Case-insensitive lookup from titles, keywords, and reference ids to link targets.

use crate::model::ReferenceIdEntry;
use crate::search::{EntryKind, SearchableEntry};
use ahash::AHashMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// What a resolved key points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// A searchable entry, registered by title or keyword.
    Entry(EntryKind),
    /// An explicit reference-id registration.
    Reference,
}

impl TargetKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Entry(kind) => kind.as_str(),
            Self::Reference => "reference",
        }
    }
}

impl Serialize for TargetKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Where a reference leads, with everything presentation needs to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceTarget {
    /// The key as it was registered (reference ids keep their leading marker).
    pub ref_id: String,
    /// Category page the target lives on.
    pub page: String,
    pub path: String,
    pub section: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: TargetKind,
}

impl ReferenceTarget {
    fn for_entry(key: &str, entry: &SearchableEntry) -> Self {
        Self {
            ref_id: key.to_string(),
            page: entry.category.clone(),
            path: entry.path.clone(),
            section: entry.section.clone(),
            description: entry.description.clone(),
            title: Some(entry.title.clone()),
            kind: TargetKind::Entry(entry.kind),
        }
    }

    fn for_reference_id(ref_id: &str, entry: &ReferenceIdEntry) -> Self {
        let path = match &entry.section {
            Some(section) if !section.is_empty() => format!("/{}#{}", entry.category, section),
            _ => format!("/{}", entry.category),
        };

        Self {
            ref_id: ref_id.to_string(),
            page: entry.category.clone(),
            path,
            section: entry.section.clone().unwrap_or_default(),
            description: entry.description.clone(),
            title: (!entry.title.is_empty()).then(|| entry.title.clone()),
            kind: TargetKind::Reference,
        }
    }
}

/// Ordered-registration, last-write-wins map of lowercased keys to targets.
///
/// Registration order is fixed: for each entry in index order, its title and then
/// its keywords; after all entries, every explicit reference id. A reference id
/// therefore overrides any title or keyword that happens to share its key.
#[derive(Debug, Clone, Default)]
pub struct ReferenceResolver {
    targets: AHashMap<String, ReferenceTarget>,
}

impl ReferenceResolver {
    pub fn build(
        entries: &[SearchableEntry],
        reference_ids: &BTreeMap<String, ReferenceIdEntry>,
    ) -> Self {
        let mut resolver = Self::default();

        for entry in entries {
            resolver.register(&entry.title, ReferenceTarget::for_entry(&entry.title, entry));
            for keyword in &entry.keywords {
                resolver.register(keyword, ReferenceTarget::for_entry(keyword, entry));
            }
        }

        for (ref_id, entry) in reference_ids {
            resolver.register(ref_id, ReferenceTarget::for_reference_id(ref_id, entry));
        }

        resolver
    }

    fn register(&mut self, key: &str, target: ReferenceTarget) {
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            return;
        }
        if let Some(previous) = self.targets.insert(key, target) {
            tracing::trace!("Reference key '{}' overridden", previous.ref_id);
        }
    }

    /// Looks up a key case-insensitively. Absence is a normal outcome.
    pub fn resolve(&self, key: &str) -> Option<&ReferenceTarget> {
        self.targets.get(&key.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
