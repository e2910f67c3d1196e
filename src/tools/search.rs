//! Rule search handler.

use super::{OutputFormat, to_json};
use crate::search::{MAX_RESULTS, SearchEngine, SearchResult};
use crate::worker::RuleState;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// Search query, e.g. 'strength' or '@Dodge'
    pub query: String,
    /// Maximum number of results to return (default: configured limit, at most 20)
    #[serde(default)]
    pub limit: Option<usize>,
    /// Reply format
    #[serde(default)]
    pub format: OutputFormat,
}

/// Execute a search against the index currently in service.
pub async fn handle_search(
    state: &Arc<RuleState>,
    request: SearchRequest,
) -> Result<String, String> {
    let index = state.require_index().await?;
    let engine = SearchEngine::new(&index);
    let results = match request.limit {
        Some(limit) => engine.search_with_limit(&request.query, limit),
        None => engine.search(&request.query),
    };

    tracing::debug!(
        "Search '{}' returned {} results",
        request.query,
        results.len()
    );

    match request.format {
        OutputFormat::Json => to_json(&results),
        OutputFormat::Text => Ok(format_search_results(&results, &request.query)),
    }
}

/// Format search results into a readable string output.
pub fn format_search_results(results: &[SearchResult], query: &str) -> String {
    if query.trim().is_empty() {
        return "Empty query. Try a rule name like 'strength' or a reference like '@Dodge'."
            .to_string();
    }

    if results.is_empty() {
        let mut msg = format!("No rules found for '{}'.\n\n", query);
        msg.push_str("Search tips:\n");
        msg.push_str("• Every word must appear in the rule's title, description, or keywords\n");
        msg.push_str("• Try fewer or shorter words\n");
        msg.push_str("• Use @Name to find rules citing a specific source\n");
        return msg;
    }

    let mut output = format!("Rules matching '{}':\n\n", query);

    for (rank, result) in results.iter().enumerate() {
        let _ = writeln!(
            output,
            "{}. {} [{}] ({})",
            rank + 1,
            result.title,
            result.kind,
            result.category
        );
        let _ = writeln!(output, "   {} in {}", result.path, result.section);
        if !result.description.is_empty() {
            let _ = writeln!(output, "   {}", first_line(&result.description));
        }
        output.push('\n');
    }

    if results.len() == MAX_RESULTS {
        output.push_str("(Results capped. Refine the query to narrow them down.)\n");
    }

    output
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default().trim()
}
