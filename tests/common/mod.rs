//! Shared test fixtures and utilities for integration tests.
//!
//! # Test Isolation Strategy
//!
//! Each test copies the sample rulebook from `tests/fixtures/rules` into its own
//! temporary directory, so tests that edit or break rule files can run in
//! parallel without interfering with each other.
//!
//! # Available Fixtures
//!
//! - `rulebook`: isolated copy of the sample rules with a loaded `RuleState`

use rstest::fixture;
use rulebook_mcp::{Config, RuleState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Returns the sample rulebook shipped with the tests.
pub fn fixture_rules_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/rules")
}

/// A temporary workspace directory for test isolation.
///
/// Provides basic filesystem operations within a temp directory that is
/// automatically cleaned up when dropped.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempWorkspace {
    /// Creates a new empty temporary workspace.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    /// Returns the root path of this workspace.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates a file with the given content within this workspace.
    ///
    /// Parent directories are created automatically if they don't exist.
    ///
    /// # Panics
    /// Panics if file creation fails.
    pub fn create_file(&self, path: &str, content: &str) {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
    }

    /// Recursively copies a directory from the real filesystem into this workspace.
    ///
    /// # Panics
    /// Panics if copying fails.
    pub fn copy_dir(&self, source: &Path, dest_relative: &str) {
        let dest = self.root.join(dest_relative);
        copy_dir_all(source, &dest).unwrap_or_else(|e| {
            panic!(
                "Failed to copy '{}' to '{}': {}",
                source.display(),
                dest_relative,
                e
            )
        });
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

fn copy_dir_all(source: &Path, dest: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dest)?;
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

/// An isolated copy of the sample rulebook plus the state serving it.
///
/// Composes [`TempWorkspace`] with a [`RuleState`] pointed at `<temp>/rules`.
#[allow(dead_code)] // Fields used across different integration test crates
pub struct Rulebook {
    workspace: TempWorkspace,
    pub state: Arc<RuleState>,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl Rulebook {
    /// Copies the sample rules and builds a state for them, without loading.
    pub fn unloaded() -> Self {
        let workspace = TempWorkspace::new();
        workspace.copy_dir(&fixture_rules_dir(), "rules");

        let config = Config {
            rules_dir: workspace.path().join("rules"),
            // Tests drive reloads explicitly
            poll_interval_secs: 0,
            ..Config::default()
        };

        Self {
            workspace,
            state: Arc::new(RuleState::new(config)),
        }
    }

    /// Root of the copied rules directory.
    pub fn rules_dir(&self) -> PathBuf {
        self.workspace.path().join("rules")
    }

    /// Writes a file relative to the rules directory.
    pub fn write_rule_file(&self, path: &str, content: &str) {
        self.workspace.create_file(&format!("rules/{}", path), content);
    }
}

/// Creates an isolated rulebook with its index already loaded.
///
/// Returns `Rulebook` rather than just the state because the temp directory
/// must stay alive for the duration of the test.
#[fixture]
pub async fn rulebook() -> Rulebook {
    let rulebook = Rulebook::unloaded();
    rulebook
        .state
        .refresh(true)
        .await
        .expect("sample rules should load");
    rulebook
}
