pub mod annotate;
pub mod resolve;
pub mod search;
pub mod status;

pub use annotate::*;
pub use resolve::*;
pub use search::*;
pub use status::*;

use rmcp::schemars;
use serde::Deserialize;

/// Reply format for tools that return structured data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("Failed to serialize reply: {}", e))
}
