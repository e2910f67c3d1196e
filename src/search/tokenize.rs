//! Query tokenization and the small string normalizations shared by the indexer,
//! the scorer, and the annotator.

/// Leading symbols that mark a reference-style keyword or citation (`@Body`, `%Strike`).
pub(crate) const MARKER_PREFIXES: &[char] = &['@', '%'];

/// Splits a query on whitespace runs and lowercases each token.
///
/// A blank query yields no tokens.
pub fn query_tokens(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

/// Removes any leading marker symbols.
pub fn strip_marker(text: &str) -> &str {
    text.trim_start_matches(MARKER_PREFIXES)
}

/// True when the text starts with a marker symbol.
pub fn is_marker(text: &str) -> bool {
    text.starts_with(MARKER_PREFIXES)
}

/// Case-insensitive equality after stripping leading markers from both sides.
pub fn marker_eq(a: &str, b: &str) -> bool {
    strip_marker(a).to_lowercase() == strip_marker(b).to_lowercase()
}

/// Entry id for an item: lowercase with every whitespace run replaced by one hyphen.
///
/// `"Lantern  Hook"` becomes `"lantern-hook"`. Leading/trailing whitespace is
/// hyphenated too, not trimmed.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_space = false;

    for c in name.chars() {
        if c.is_whitespace() {
            if !in_space {
                slug.push('-');
                in_space = true;
            }
        } else {
            slug.extend(c.to_lowercase());
            in_space = false;
        }
    }

    slug
}
