//! Statement filtering by prefix.

use crate::statement::Statement;

/// Prefixes removed from a batch unless the caller says otherwise.
pub const DEFAULT_EXCLUDED_PREFIXES: [&str; 3] = ["DROP", "LOCK", "UNLOCK"];

/// Returns true if `text` starts with any of `excluded_prefixes`.
///
/// Matching is an exact, case-sensitive prefix test on the text as given.
#[must_use]
pub fn is_excluded<S: AsRef<str>>(text: &str, excluded_prefixes: &[S]) -> bool {
    excluded_prefixes
        .iter()
        .any(|prefix| text.starts_with(prefix.as_ref()))
}

/// Removes statements that start with one of `excluded_prefixes`.
///
/// Returns the kept statements, in their original order and with their
/// original ordinals, together with the number removed.
#[must_use]
pub fn filter<S: AsRef<str>>(
    statements: Vec<Statement>,
    excluded_prefixes: &[S],
) -> (Vec<Statement>, usize) {
    let total = statements.len();
    let kept: Vec<Statement> = statements
        .into_iter()
        .filter(|stmt| !is_excluded(&stmt.text, excluded_prefixes))
        .collect();
    let removed = total - kept.len();
    (kept, removed)
}
