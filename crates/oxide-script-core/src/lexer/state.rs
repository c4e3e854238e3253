//! Scanner states.

use std::fmt;

/// The lexical context the splitter is in.
///
/// Exactly one state is active at a time. The next state depends only on the
/// current state and the next character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    /// Plain statement text.
    #[default]
    Normal,
    /// Saw `-`, which may open a line comment.
    LineCommentStart,
    /// Inside `-- ...`, until end of line.
    LineComment,
    /// Saw `/`, which may open a block comment.
    BlockCommentStart,
    /// Inside `/* ... */`.
    BlockComment,
    /// Saw `*` inside a block comment, which may close it.
    BlockCommentEnd,
    /// Inside a string opened by the given quote character.
    Quoted(char),
    /// Saw `\` inside a string; the next character is taken literally.
    QuotedEscape(char),
}

impl ScanState {
    /// Returns true inside a quoted string, escaped or not.
    #[must_use]
    pub const fn is_quoted(self) -> bool {
        matches!(self, Self::Quoted(_) | Self::QuotedEscape(_))
    }

    /// Returns true if input ending here leaves a string or block comment
    /// open.
    ///
    /// A pending `-` or `/` is not counted, and neither is an open line
    /// comment, since end of input closes it naturally.
    #[must_use]
    pub const fn is_unterminated(self) -> bool {
        self.is_quoted() || matches!(self, Self::BlockComment | Self::BlockCommentEnd)
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => f.write_str("normal"),
            Self::LineCommentStart => f.write_str("line comment start"),
            Self::LineComment => f.write_str("line comment"),
            Self::BlockCommentStart => f.write_str("block comment start"),
            Self::BlockComment => f.write_str("block comment"),
            Self::BlockCommentEnd => f.write_str("block comment end"),
            Self::Quoted(q) => write!(f, "quoted string ({q})"),
            Self::QuotedEscape(q) => write!(f, "escape in quoted string ({q})"),
        }
    }
}
