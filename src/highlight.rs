//! Line-level highlight heuristic
//!
//! Marks the lines of a retrieved snippet that mention any meaningful query token. This is a
//! display aid only: it never feeds back into ranking or scoring.

use std::collections::BTreeSet;

/// Tokens of this many characters or fewer are ignored
const MIN_TOKEN_CHARS: usize = 2;

/// Return the 1-based numbers of every line in `code` that contains at least one query token
/// longer than two characters, compared case-insensitively.
pub fn highlight_lines(code: &str, query: &str) -> BTreeSet<usize> {
    let tokens = query_tokens(query);
    if tokens.is_empty() {
        return BTreeSet::new();
    }

    code.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.to_lowercase();
            tokens.iter().any(|token| line.contains(token.as_str()))
        })
        .map(|(index, _)| index + 1)
        .collect()
}

/// Lower-cased whitespace tokens that are long enough to match on
fn query_tokens(query: &str) -> Vec<String> {
    let mut tokens: Vec<String> = query
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|token| token.chars().count() > MIN_TOKEN_CHARS)
        .collect();
    tokens.sort_unstable();
    tokens.dedup();
    tokens
}
