//! Character-scanning statement splitter.

use super::ScanState;
use crate::statement::Statement;

/// Splits script text into statements.
///
/// The splitter makes a single left-to-right pass with one character of
/// lookahead held in [`ScanState`]. Comment bodies are dropped, quoted
/// strings are kept verbatim, and a statement boundary is only recognised on
/// a `;` in [`ScanState::Normal`]. Text can be fed in chunks; boundaries do
/// not depend on how the input was chunked.
///
/// Input that ends inside a string or comment is never an error: whatever is
/// buffered is flushed as the final statement.
#[derive(Debug, Default)]
pub struct Splitter {
    /// The current lexical context.
    state: ScanState,
    /// Text of the statement being accumulated.
    buffer: String,
    /// Statements emitted so far.
    statements: Vec<Statement>,
}

impl Splitter {
    /// Creates a new splitter in the normal state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ScanState::Normal,
            buffer: String::new(),
            statements: Vec::new(),
        }
    }

    /// Returns the current lexical context.
    #[must_use]
    pub const fn state(&self) -> ScanState {
        self.state
    }

    /// Returns the number of statements emitted so far.
    #[must_use]
    pub fn emitted(&self) -> usize {
        self.statements.len()
    }

    /// Feeds a chunk of text.
    pub fn feed(&mut self, text: &str) {
        for c in text.chars() {
            self.push(c);
        }
    }

    /// Feeds a single character.
    pub fn push(&mut self, c: char) {
        self.state = match self.state {
            ScanState::Normal => {
                self.buffer.push(c);
                match c {
                    '\'' | '"' => ScanState::Quoted(c),
                    '-' => ScanState::LineCommentStart,
                    '/' => ScanState::BlockCommentStart,
                    ';' => {
                        self.emit();
                        ScanState::Normal
                    }
                    _ => ScanState::Normal,
                }
            }
            ScanState::LineCommentStart => {
                if c == '-' {
                    // Drop the buffered first dash.
                    self.buffer.pop();
                    ScanState::LineComment
                } else {
                    // Not a comment. The character is kept as-is and is not
                    // re-examined, so `-'` does not open a string.
                    self.buffer.push(c);
                    ScanState::Normal
                }
            }
            ScanState::LineComment => {
                if c == '\n' {
                    // Keep the newline so the statement keeps its line layout.
                    self.buffer.push(c);
                    ScanState::Normal
                } else {
                    ScanState::LineComment
                }
            }
            ScanState::BlockCommentStart => {
                if c == '*' {
                    self.buffer.pop();
                    ScanState::BlockComment
                } else {
                    self.buffer.push(c);
                    ScanState::Normal
                }
            }
            ScanState::BlockComment => {
                if c == '*' {
                    ScanState::BlockCommentEnd
                } else {
                    ScanState::BlockComment
                }
            }
            ScanState::BlockCommentEnd => match c {
                '/' => ScanState::Normal,
                '*' => ScanState::BlockCommentEnd,
                _ => ScanState::BlockComment,
            },
            ScanState::Quoted(quote) => {
                self.buffer.push(c);
                if c == '\\' {
                    ScanState::QuotedEscape(quote)
                } else if c == quote {
                    ScanState::Normal
                } else {
                    ScanState::Quoted(quote)
                }
            }
            ScanState::QuotedEscape(quote) => {
                self.buffer.push(c);
                ScanState::Quoted(quote)
            }
        };
    }

    /// Flushes any buffered text and returns all statements in order.
    #[must_use]
    pub fn finish(mut self) -> Vec<Statement> {
        let rest = self
            .buffer
            .trim_end_matches(|c: char| c == ';' || c.is_whitespace())
            .trim_start();
        if !rest.is_empty() {
            let ordinal = self.statements.len();
            self.statements.push(Statement::new(ordinal, rest));
        }
        self.statements
    }

    /// Ends the current statement at a `;` that was just buffered.
    fn emit(&mut self) {
        self.buffer.pop();
        let text = self.buffer.trim();
        if !text.is_empty() {
            let ordinal = self.statements.len();
            self.statements.push(Statement::new(ordinal, text));
        }
        self.buffer.clear();
    }
}

/// Splits script text into statements.
///
/// Returns statements in script order, numbered from zero. Empty and
/// whitespace-only statements are never produced.
#[must_use]
pub fn split(text: &str) -> Vec<Statement> {
    let mut splitter = Splitter::new();
    splitter.feed(text);
    splitter.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<String> {
        split(input).into_iter().map(|s| s.text).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(split("").is_empty());
    }

    #[test]
    fn test_whitespace_and_semicolons_only() {
        assert!(split("  \n\t ;; ;\n").is_empty());
    }

    #[test]
    fn test_ordinals_follow_emission_order() {
        let stmts = split("SELECT 1;;SELECT 2;\nSELECT 3");
        let ordinals: Vec<usize> = stmts.iter().map(|s| s.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2]);
        assert_eq!(stmts[2].text, "SELECT 3");
    }

    #[test]
    fn test_line_comment_keeps_newline() {
        assert_eq!(texts("SELECT a -- pick a\nFROM t;"), vec!["SELECT a \nFROM t"]);
    }

    #[test]
    fn test_minus_is_not_a_comment() {
        assert_eq!(texts("SELECT 3 - 1;"), vec!["SELECT 3 - 1"]);
        assert_eq!(texts("SELECT 3-1;"), vec!["SELECT 3-1"]);
    }

    #[test]
    fn test_char_after_lone_dash_is_not_reexamined() {
        // The quote after `-` is kept literally and does not open a string,
        // so the later `;` still splits.
        assert_eq!(texts("SELECT 1-'a;b'"), vec!["SELECT 1-'a", "b'"]);
    }

    #[test]
    fn test_slash_is_not_a_comment() {
        assert_eq!(texts("SELECT 4 / 2;"), vec!["SELECT 4 / 2"]);
    }

    #[test]
    fn test_block_comment_removed_inline() {
        assert_eq!(texts("SELECT /* cols */ a FROM t;"), vec!["SELECT  a FROM t"]);
    }

    #[test]
    fn test_block_comment_star_runs() {
        assert_eq!(texts("/** doc **/SELECT 1;"), vec!["SELECT 1"]);
        assert_eq!(texts("/* a * b */SELECT 1;"), vec!["SELECT 1"]);
    }

    #[test]
    fn test_nested_block_comment_closes_at_first_end() {
        // The first `*/` closes the comment; the tail is statement text.
        assert_eq!(texts("/* a /* b */ c */ SELECT 1;"), vec!["c */ SELECT 1"]);
    }

    #[test]
    fn test_semicolon_inside_comments() {
        assert_eq!(texts("SELECT 1 -- a; b\n;"), vec!["SELECT 1"]);
        assert_eq!(texts("SELECT /* ; */ 1;"), vec!["SELECT  1"]);
    }

    #[test]
    fn test_double_quoted_string() {
        assert_eq!(
            texts(r#"INSERT INTO t VALUES ("x;y", 'z');"#),
            vec![r#"INSERT INTO t VALUES ("x;y", 'z')"#]
        );
    }

    #[test]
    fn test_other_quote_inside_string() {
        assert_eq!(texts(r#"SELECT "it's; fine";"#), vec![r#"SELECT "it's; fine""#]);
    }

    #[test]
    fn test_comment_markers_inside_string() {
        assert_eq!(
            texts("SELECT '-- not a comment', '/* nor this */';"),
            vec!["SELECT '-- not a comment', '/* nor this */'"]
        );
    }

    #[test]
    fn test_escaped_backslash_then_quote_closes() {
        // `\\` is an escaped backslash, so the following quote closes.
        assert_eq!(texts(r"SELECT 'a\\'; SELECT 2;"), vec![r"SELECT 'a\\'", "SELECT 2"]);
    }

    #[test]
    fn test_unterminated_quote_is_flushed() {
        assert_eq!(texts("SELECT 1; SELECT 'abc; def"), vec!["SELECT 1", "SELECT 'abc; def"]);
    }

    #[test]
    fn test_unterminated_quote_trailing_semicolon_stripped() {
        assert_eq!(texts("SELECT 'abc;  "), vec!["SELECT 'abc"]);
    }

    #[test]
    fn test_escape_at_end_of_input_is_flushed() {
        assert_eq!(texts(r"SELECT 'abc\"), vec![r"SELECT 'abc\"]);
    }

    #[test]
    fn test_unterminated_block_comment_drops_body() {
        assert_eq!(texts("SELECT 1 /* never closed; "), vec!["SELECT 1"]);
    }

    #[test]
    fn test_trailing_line_comment_without_newline() {
        assert_eq!(texts("SELECT 1 -- done"), vec!["SELECT 1"]);
    }

    #[test]
    fn test_pending_dash_at_end_is_kept() {
        assert_eq!(texts("SELECT 1 -"), vec!["SELECT 1 -"]);
    }

    #[test]
    fn test_chunked_feed_matches_whole() {
        let script = "INSERT INTO t VALUES ('a;b'); /* c; */ -- d\nSELECT 2;";
        let mut splitter = Splitter::new();
        for chunk in script.as_bytes().chunks(3) {
            splitter.feed(std::str::from_utf8(chunk).unwrap_or_default());
        }
        assert_eq!(splitter.finish(), split(script));
    }

    #[test]
    fn test_state_after_feed() {
        let mut splitter = Splitter::new();
        splitter.feed("SELECT 'open");
        assert_eq!(splitter.state(), ScanState::Quoted('\''));
        splitter.feed("'; /* x");
        assert_eq!(splitter.state(), ScanState::BlockComment);
        assert_eq!(splitter.emitted(), 1);
    }

    #[test]
    fn test_multibyte_text_preserved() {
        assert_eq!(
            texts("INSERT INTO t VALUES ('héllo; wörld'); SELECT '日本';"),
            vec!["INSERT INTO t VALUES ('héllo; wörld')", "SELECT '日本'"]
        );
    }
}
