//! Delimiter splitting without lexical awareness.

use crate::statement::Statement;

/// Splits on every occurrence of `delimiter`, ignoring quotes and comments.
///
/// Only suitable for scripts known not to contain the delimiter inside
/// literals. Pieces are trimmed and empty pieces are dropped.
#[must_use]
pub fn split_on(text: &str, delimiter: char) -> Vec<Statement> {
    text.split(delimiter)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .enumerate()
        .map(|(ordinal, piece)| Statement::new(ordinal, piece))
        .collect()
}
