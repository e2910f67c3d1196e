//! Reads the rule document set from disk.
//!
//! Layout under the rules directory:
//!
//! ```text
//! rules/
//!   categories/<category>.json   one RuleDocument per category
//!   quick-reference.json         optional, category -> [QuickReferenceItem]
//!   reference-ids.json           optional, refId -> ReferenceIdEntry
//! ```

use crate::error::LoadError;
use crate::model::{RuleDocument, RuleSet};
use ignore::WalkBuilder;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

pub const CATEGORIES_DIR: &str = "categories";
pub const QUICK_REFERENCE_FILE: &str = "quick-reference.json";
pub const REFERENCE_IDS_FILE: &str = "reference-ids.json";

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// All `.json` files under `dir` (down to `max_depth`), sorted by path.
pub(crate) fn json_files(dir: &Path, max_depth: Option<usize>) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkBuilder::new(dir)
        .max_depth(max_depth)
        .build()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_some_and(|t| t.is_file()))
        .map(ignore::DirEntry::into_path)
        .filter(|path| is_json(path))
        .collect();

    files.sort();
    files
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads an optional top-level file, treating absence as empty.
fn read_optional<T: DeserializeOwned + Default>(path: &Path) -> Result<T, LoadError> {
    if path.is_file() {
        read_json(path)
    } else {
        tracing::debug!("No {} found, using empty table", path.display());
        Ok(T::default())
    }
}

/// Loads the complete document set. Any unreadable or malformed file fails the
/// whole load, so a partial set is never indexed.
pub fn load_rule_set(root: &Path) -> Result<RuleSet, LoadError> {
    if !root.is_dir() {
        return Err(LoadError::MissingRulesDir {
            path: root.to_path_buf(),
        });
    }

    let mut rules = RuleSet::default();

    let categories_dir = root.join(CATEGORIES_DIR);
    if categories_dir.is_dir() {
        for path in json_files(&categories_dir, Some(1)) {
            let Some(category) = path.file_stem().and_then(|s| s.to_str()) else {
                tracing::warn!("Skipping rule file with non-UTF-8 name: {}", path.display());
                continue;
            };
            let document: RuleDocument = read_json(&path)?;
            rules.documents.insert(category.to_string(), document);
        }
    } else {
        tracing::warn!("No {} directory under {}", CATEGORIES_DIR, root.display());
    }

    rules.quick_reference = read_optional(&root.join(QUICK_REFERENCE_FILE))?;
    rules.reference_ids = read_optional(&root.join(REFERENCE_IDS_FILE))?;

    tracing::debug!(
        "Loaded {} category documents, {} quick-reference categories, {} reference ids from {}",
        rules.documents.len(),
        rules.quick_reference.len(),
        rules.reference_ids.len(),
        root.display()
    );

    Ok(rules)
}

/// [`load_rule_set`] on the blocking thread pool.
pub async fn load_rule_set_async(root: PathBuf) -> Result<RuleSet, LoadError> {
    tokio::task::spawn_blocking(move || load_rule_set(&root))
        .await
        .map_err(|e| LoadError::Interrupted(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_loads_categories_and_tables() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "categories/combat.json",
            r#"{ "title": "Combat", "sections": [] }"#,
        );
        write(dir.path(), "categories/notes.txt", "ignored");
        write(
            dir.path(),
            "quick-reference.json",
            r#"{ "combat": [ { "term": "Dodge" } ] }"#,
        );

        let_assert!(Ok(rules) = load_rule_set(dir.path()));
        check!(rules.documents.len() == 1);
        check!(rules.documents.contains_key("combat"));
        check!(rules.quick_reference["combat"].len() == 1);
        check!(rules.reference_ids.is_empty());
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let_assert!(
            Err(LoadError::MissingRulesDir { .. }) = load_rule_set(&dir.path().join("nope"))
        );
    }

    #[test]
    fn test_malformed_file_names_the_path() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "categories/broken.json", "{ not json");

        let_assert!(Err(LoadError::Parse { path, .. }) = load_rule_set(dir.path()));
        check!(path.ends_with("broken.json"));
    }
}
