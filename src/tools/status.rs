//! Reload and status handlers.

use crate::worker::{RuleState, RuleStatus};
use std::fmt::Write as _;
use std::sync::Arc;

/// Force a rebuild from disk, keeping the current index if loading fails.
pub async fn handle_reload(state: &Arc<RuleState>) -> Result<String, String> {
    state
        .refresh(true)
        .await
        .map_err(|e| format!("Reload failed, previous rules stay in service: {}", e))?;

    Ok(format_status(&state.status().await))
}

pub async fn handle_status(state: &Arc<RuleState>) -> String {
    format_status(&state.status().await)
}

pub fn format_status(status: &RuleStatus) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Rules directory: {}", status.rules_dir.display());
    if status.loaded {
        let _ = writeln!(output, "Generation: {}", status.generation);
        let _ = writeln!(output, "Searchable entries: {}", status.entries);
        let _ = writeln!(output, "Reference keys: {}", status.reference_keys);
    } else {
        output.push_str("No rules loaded\n");
    }
    if let Some(error) = &status.last_error {
        let _ = writeln!(output, "Last load error: {}", error);
    }
    output
}
