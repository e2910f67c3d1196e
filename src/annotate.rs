//! Turns rules prose into typed spans: emphasis runs and resolved references.
//!
//! Markers (`@Body`) are resolved before any emphasis is sliced, so a marker
//! inside `**bold**` still becomes its own reference span. Resolved markers are
//! swapped for private-use slot characters while emphasis is applied, then
//! swapped back. Slot characters already present in the input are slotted too,
//! so they come back out as literal text.

use crate::resolve::{ReferenceResolver, ReferenceTarget, TargetKind};
use crate::search::strip_marker;
use regex::{Captures, Regex};
use serde::Serialize;
use std::sync::LazyLock;

const SLOT_OPEN: char = '\u{E000}';
const SLOT_CLOSE: char = '\u{E001}';

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+(?:-\w+)*").expect("marker pattern"));
static SLOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{E000}(\\d+)\u{E001}").expect("slot pattern"));
static BOLD_ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*\*(.+?)\*\*\*").expect("bold-italic pattern"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.+?)\*").expect("italic pattern"));

/// How a span should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpanKind {
    Plain,
    Bold,
    Italic,
    BoldItalic,
    Reference,
}

/// One run of annotated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub kind: SpanKind,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<ReferenceTarget>,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: SpanKind::Plain,
            text: text.into(),
            target: None,
        }
    }

    pub fn styled(kind: SpanKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            target: None,
        }
    }

    pub fn reference(text: impl Into<String>, target: ReferenceTarget) -> Self {
        Self {
            kind: SpanKind::Reference,
            text: text.into(),
            target: Some(target),
        }
    }
}

/// What a slot stands for while emphasis is applied.
#[derive(Debug, Clone)]
enum Slot {
    Reference(String, ReferenceTarget),
    /// A slot delimiter that was part of the input.
    Literal(char),
}

fn push_slot(slots: &mut Vec<Slot>, slot: Slot) -> String {
    let placeholder = format!("{}{}{}", SLOT_OPEN, slots.len(), SLOT_CLOSE);
    slots.push(slot);
    placeholder
}

/// A stretch of text after emphasis slicing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'t> {
    Raw(&'t str),
    Styled(SpanKind, &'t str),
}

/// Splits every raw segment on one emphasis level; styled segments pass through untouched.
fn apply_emphasis<'t>(
    segments: Vec<Segment<'t>>,
    pattern: &Regex,
    kind: SpanKind,
) -> Vec<Segment<'t>> {
    let mut out = Vec::with_capacity(segments.len());

    for segment in segments {
        let Segment::Raw(text) = segment else {
            out.push(segment);
            continue;
        };

        let mut last = 0;
        for caps in pattern.captures_iter(text) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() > last {
                out.push(Segment::Raw(&text[last..whole.start()]));
            }
            out.push(Segment::Styled(kind, inner.as_str()));
            last = whole.end();
        }
        if last < text.len() {
            out.push(Segment::Raw(&text[last..]));
        }
    }

    out
}

/// Splits text into whitespace runs, word runs, and single punctuation characters.
///
/// Concatenating the pieces reproduces the input exactly.
fn split_words(text: &str) -> Vec<&str> {
    #[derive(PartialEq, Eq, Clone, Copy)]
    enum Class {
        Space,
        Word,
        Punct,
    }

    fn classify(c: char) -> Class {
        if c.is_whitespace() {
            Class::Space
        } else if c.is_alphanumeric() || matches!(c, '_' | '\'' | '-' | '@') {
            Class::Word
        } else {
            Class::Punct
        }
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    let mut current: Option<Class> = None;

    for (i, c) in text.char_indices() {
        let class = classify(c);
        match current {
            Some(prev) if prev == class && class != Class::Punct => {}
            Some(_) => {
                pieces.push(&text[start..i]);
                start = i;
            }
            None => {}
        }
        current = Some(class);
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces
}

/// Appends a span, merging adjacent spans of the same emphasis kind.
fn push_span(spans: &mut Vec<Span>, span: Span) {
    if span.text.is_empty() {
        return;
    }
    if span.kind != SpanKind::Reference
        && let Some(last) = spans.last_mut()
        && last.kind == span.kind
    {
        last.text.push_str(&span.text);
        return;
    }
    spans.push(span);
}

/// Annotates prose against a [`ReferenceResolver`].
#[derive(Debug, Clone, Copy)]
pub struct TextAnnotator<'a> {
    resolver: &'a ReferenceResolver,
}

impl<'a> TextAnnotator<'a> {
    pub const fn new(resolver: &'a ReferenceResolver) -> Self {
        Self { resolver }
    }

    /// Produces spans in left-to-right order.
    ///
    /// With `references_only` set, only `@marker` tokens are linked; otherwise
    /// plain words that name an entry are linked too.
    pub fn annotate(&self, text: &str, references_only: bool) -> Vec<Span> {
        let mut slots: Vec<Slot> = Vec::new();

        let mut escaped = String::with_capacity(text.len());
        for c in text.chars() {
            if c == SLOT_OPEN || c == SLOT_CLOSE {
                escaped.push_str(&push_slot(&mut slots, Slot::Literal(c)));
            } else {
                escaped.push(c);
            }
        }

        let slotted = MARKER.replace_all(&escaped, |caps: &Captures<'_>| {
            let word = &caps[0];
            let embedded = caps.get(0).is_some_and(|m| {
                escaped[..m.start()]
                    .chars()
                    .next_back()
                    .is_some_and(char::is_alphanumeric)
            });

            match self.resolve_marker(word) {
                Some(target) if !embedded => push_slot(
                    &mut slots,
                    Slot::Reference(word.to_string(), target.clone()),
                ),
                _ => word.to_string(),
            }
        });

        let mut segments = vec![Segment::Raw(&slotted)];
        segments = apply_emphasis(segments, &BOLD_ITALIC, SpanKind::BoldItalic);
        segments = apply_emphasis(segments, &BOLD, SpanKind::Bold);
        segments = apply_emphasis(segments, &ITALIC, SpanKind::Italic);

        let mut spans = Vec::new();
        for segment in segments {
            let (kind, text) = match segment {
                Segment::Raw(text) => (SpanKind::Plain, text),
                Segment::Styled(kind, text) => (kind, text),
            };
            self.emit(&mut spans, kind, text, &slots, references_only);
        }

        spans
    }

    /// Emits one segment, restoring slots as reference spans or literal text.
    fn emit(
        &self,
        spans: &mut Vec<Span>,
        kind: SpanKind,
        text: &str,
        slots: &[Slot],
        references_only: bool,
    ) {
        let mut last = 0;
        for caps in SLOT.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            self.emit_text(spans, kind, &text[last..whole.start()], references_only);

            let slot = caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|idx| slots.get(idx));
            match slot {
                Some(Slot::Reference(word, target)) => {
                    push_span(spans, Span::reference(word.clone(), target.clone()));
                }
                Some(Slot::Literal(c)) => push_span(spans, Span::styled(kind, c.to_string())),
                None => {}
            }
            last = whole.end();
        }
        self.emit_text(spans, kind, &text[last..], references_only);
    }

    /// Emits slot-free text, linking plain words that name an entry.
    fn emit_text(&self, spans: &mut Vec<Span>, kind: SpanKind, text: &str, references_only: bool) {
        if text.is_empty() {
            return;
        }
        if references_only || kind != SpanKind::Plain {
            push_span(spans, Span::styled(kind, text));
            return;
        }

        for piece in split_words(text) {
            match self.resolve_word(piece) {
                Some(target) => push_span(spans, Span::reference(piece, target.clone())),
                None => push_span(spans, Span::plain(piece)),
            }
        }
    }

    /// Resolves a marker by its full key, then by its bare name.
    fn resolve_marker(&self, marker: &str) -> Option<&'a ReferenceTarget> {
        self.resolver
            .resolve(marker)
            .or_else(|| self.resolver.resolve(strip_marker(marker)))
    }

    /// Resolves a plain word. Reference-id targets are left for markers to link.
    fn resolve_word(&self, word: &str) -> Option<&'a ReferenceTarget> {
        if word.starts_with('@') {
            return None;
        }
        let key = word.trim_matches(|c: char| !c.is_alphanumeric());
        if key.is_empty() {
            return None;
        }
        self.resolver
            .resolve(key)
            .filter(|target| target.kind != TargetKind::Reference)
    }
}
