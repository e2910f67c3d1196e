//! Reference resolution handler.

use crate::resolve::ReferenceTarget;
use crate::worker::RuleState;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ResolveRequest {
    /// Reference key: a reference id, entry title, or keyword (case-insensitive)
    pub key: String,
    /// Reply format
    #[serde(default)]
    pub format: super::OutputFormat,
}

pub async fn handle_resolve(
    state: &Arc<RuleState>,
    request: ResolveRequest,
) -> Result<String, String> {
    let index = state.require_index().await?;

    let Some(target) = index.resolver().resolve(&request.key) else {
        return Err(format!(
            "No rule or reference found for '{}'. Keys are matched exactly (ignoring case).",
            request.key.trim()
        ));
    };

    match request.format {
        super::OutputFormat::Json => super::to_json(target),
        super::OutputFormat::Text => Ok(format_target(target)),
    }
}

pub fn format_target(target: &ReferenceTarget) -> String {
    let mut output = String::new();
    let heading = target.title.as_deref().unwrap_or(&target.ref_id);
    let _ = writeln!(output, "{} [{}]", heading, target.kind.as_str());
    let _ = writeln!(output, "Page: {}", target.page);
    let _ = writeln!(output, "Path: {}", target.path);
    if !target.section.is_empty() {
        let _ = writeln!(output, "Section: {}", target.section);
    }
    if !target.description.is_empty() {
        let _ = writeln!(output, "\n{}", target.description);
    }
    output
}
