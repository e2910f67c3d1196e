//! Content fingerprint of the rules directory, used to decide when to rebuild.

use crate::error::LoadError;
use crate::loader::json_files;
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::Xxh3;

/// Hash every JSON file under `root` (relative path + bytes) in sorted order.
///
/// Relative paths are hashed so the fingerprint survives moving the directory.
pub fn fingerprint_rules(root: &Path) -> Result<u64, LoadError> {
    if !root.is_dir() {
        return Err(LoadError::MissingRulesDir {
            path: root.to_path_buf(),
        });
    }

    let mut hasher = Xxh3::new();

    for path in json_files(root, None) {
        if let Ok(rel_path) = path.strip_prefix(root) {
            hasher.update(rel_path.to_string_lossy().as_bytes());
            hasher.update(&[0]);
        }

        let bytes = std::fs::read(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        hasher.update(&bytes);
        hasher.update(&[0]);
    }

    Ok(hasher.digest())
}

/// [`fingerprint_rules`] on the blocking thread pool.
pub async fn fingerprint_rules_async(root: PathBuf) -> Result<u64, LoadError> {
    tokio::task::spawn_blocking(move || fingerprint_rules(&root))
        .await
        .map_err(|e| LoadError::Interrupted(e.to_string()))?
}
