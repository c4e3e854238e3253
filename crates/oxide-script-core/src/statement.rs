//! Executable statement units.

use std::fmt;

/// A single executable unit of script text.
///
/// Text is trimmed and carries no trailing `;`. The ordinal is the position
/// the statement had in the sequence it was split from, and survives
/// filtering so diagnostics can point back at the script.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    /// Zero-based position in the originating sequence.
    pub ordinal: usize,
    /// Statement text, without the terminating semicolon.
    pub text: String,
}

impl Statement {
    /// Creates a new statement.
    #[must_use]
    pub fn new(ordinal: usize, text: impl Into<String>) -> Self {
        Self {
            ordinal,
            text: text.into(),
        }
    }
}

impl AsRef<str> for Statement {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Renumbers statements sequentially from zero, preserving order.
#[must_use]
pub fn renumber(statements: Vec<Statement>) -> Vec<Statement> {
    statements
        .into_iter()
        .enumerate()
        .map(|(ordinal, stmt)| Statement { ordinal, ..stmt })
        .collect()
}
