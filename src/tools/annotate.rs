//! Text annotation handler.

use super::{OutputFormat, to_json};
use crate::annotate::{Span, SpanKind};
use crate::worker::RuleState;
use rmcp::schemars;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AnnotateRequest {
    /// Rule text with optional @markers and *emphasis*
    pub text: String,
    /// Only link @markers, not plain words that match a rule name
    #[serde(default)]
    pub references_only: bool,
    /// Reply format: text renders Markdown, json returns the span list
    #[serde(default)]
    pub format: OutputFormat,
}

pub async fn handle_annotate(
    state: &Arc<RuleState>,
    request: AnnotateRequest,
) -> Result<String, String> {
    let spans = state
        .annotate(&request.text, request.references_only)
        .await?;

    match request.format {
        OutputFormat::Json => to_json(spans.as_ref()),
        OutputFormat::Text => Ok(render_markdown(&spans)),
    }
}

/// Renders spans back to Markdown, turning references into links.
pub fn render_markdown(spans: &[Span]) -> String {
    let mut output = String::new();
    for span in spans {
        match (span.kind, &span.target) {
            (SpanKind::Reference, Some(target)) => {
                output.push('[');
                output.push_str(&span.text);
                output.push_str("](");
                output.push_str(&target.path);
                output.push(')');
            }
            (SpanKind::Bold, _) => wrap(&mut output, "**", &span.text),
            (SpanKind::Italic, _) => wrap(&mut output, "*", &span.text),
            (SpanKind::BoldItalic, _) => wrap(&mut output, "***", &span.text),
            _ => output.push_str(&span.text),
        }
    }
    output
}

fn wrap(output: &mut String, marker: &str, text: &str) {
    output.push_str(marker);
    output.push_str(text);
    output.push_str(marker);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{ReferenceTarget, TargetKind};
    use assert2::check;

    #[test]
    fn test_render_markdown() {
        let target = ReferenceTarget {
            ref_id: "@Body".to_string(),
            page: "combat".to_string(),
            path: "/combat#body".to_string(),
            section: "Body".to_string(),
            description: String::new(),
            title: None,
            kind: TargetKind::Reference,
        };
        let spans = vec![
            Span::plain("The "),
            Span::styled(SpanKind::BoldItalic, "hero"),
            Span::plain(" uses "),
            Span::reference("@Body", target),
            Span::plain(" to "),
            Span::styled(SpanKind::Italic, "push"),
        ];

        check!(render_markdown(&spans) == "The ***hero*** uses [@Body](/combat#body) to *push*");
    }
}
