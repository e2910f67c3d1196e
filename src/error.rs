//! Error handling types and utilities.

use std::path::PathBuf;

/// A specialized Result type for rulebook-mcp plumbing.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` at the application edges (CLI, server startup).
pub type Result<T> = anyhow::Result<T>;

/// Error returned when loading the rule document set fails.
///
/// A document that parses but lacks sections is not an error; the indexer skips it.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The configured rules directory does not exist.
    #[error("Rules directory not found at {}", path.display())]
    MissingRulesDir { path: PathBuf },
    /// A rule file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A rule file is not valid JSON for its expected shape.
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The blocking load task was cancelled or panicked.
    #[error("Rule loading task failed: {0}")]
    Interrupted(String),
}

/// Error returned when reading the configuration file fails.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
