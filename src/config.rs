//! Server configuration loaded from TOML.

use crate::error::ConfigError;
use crate::search::{DEFAULT_CHARACTER_CREATION_CATEGORY, IndexOptions, MAX_RESULTS};
use serde::Deserialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "RULEBOOK_CONFIG";

/// Config file looked up in the current directory.
pub const LOCAL_CONFIG_FILE: &str = "rulebook.toml";

/// Expands tilde (`~`) in a path to the user's home directory.
///
/// - `~/foo` becomes `/home/user/foo`
/// - `~` becomes `/home/user`
/// - Other paths are returned unchanged
pub fn expand_tilde(path: &str) -> Cow<'_, str> {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Cow::Owned(home.join(stripped).display().to_string());
        }
    } else if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return Cow::Owned(home.display().to_string());
    }
    Cow::Borrowed(path)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding `categories/`, `quick-reference.json`, `reference-ids.json`.
    pub rules_dir: PathBuf,
    /// Category whose exact-citation stat matches are promoted to the first result.
    pub character_creation_category: String,
    /// Maximum results per search (1..=20).
    pub result_limit: usize,
    /// Seconds between change checks. Zero disables background reloading.
    pub poll_interval_secs: u64,
    /// Annotation results kept in memory. Zero disables the cache.
    pub annotation_cache_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rules_dir: PathBuf::from("rules"),
            character_creation_category: DEFAULT_CHARACTER_CREATION_CATEGORY.to_string(),
            result_limit: MAX_RESULTS,
            poll_interval_secs: 5,
            annotation_cache_size: 256,
        }
    }
}

impl Config {
    /// Parses a config file. A relative `rules_dir` is resolved against the
    /// file's own directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let rules_dir = config.rules_dir.to_string_lossy().into_owned();
        config.rules_dir = PathBuf::from(expand_tilde(&rules_dir).into_owned());
        if config.rules_dir.is_relative()
            && let Some(parent) = path.parent()
        {
            config.rules_dir = parent.join(&config.rules_dir);
        }

        Ok(config)
    }

    /// Finds and loads the config file.
    ///
    /// Lookup order: `explicit`, `$RULEBOOK_CONFIG`, `./rulebook.toml`,
    /// `<config dir>/rulebook-mcp/config.toml`. Falls back to defaults when none
    /// exist. Returns the file that was used, if any.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        let candidates = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .into_iter()
            .chain(std::iter::once(PathBuf::from(LOCAL_CONFIG_FILE)))
            .chain(dirs::config_dir().map(|dir| dir.join("rulebook-mcp").join("config.toml")));

        for candidate in candidates {
            if candidate.is_file() {
                tracing::debug!("Using config file {}", candidate.display());
                return Ok((Self::load(&candidate)?, Some(candidate)));
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok((Self::default(), None))
    }

    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            character_creation_category: self.character_creation_category.clone(),
            result_limit: self.result_limit,
        }
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_secs > 0).then(|| Duration::from_secs(self.poll_interval_secs))
    }
}
