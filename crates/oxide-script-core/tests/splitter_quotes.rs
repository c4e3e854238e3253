//! Tests for quoted strings in the splitter.

mod common;
use common::*;

#[test]
fn test_semicolon_inside_single_quotes() {
    assert_splits("INSERT INTO t VALUES ('a;b');", &["INSERT INTO t VALUES ('a;b')"]);
}

#[test]
fn test_escaped_quote_does_not_close() {
    assert_splits("SELECT 'it\\'s';", &["SELECT 'it\\'s'"]);
}

#[test]
fn test_escaped_quote_followed_by_semicolon() {
    assert_splits("SELECT 'a\\';b'; SELECT 2;", &["SELECT 'a\\';b'", "SELECT 2"]);
}

#[test]
fn test_doubled_quote_reopens_string() {
    // `''` closes and reopens, so the content stays quoted.
    assert_splits("SELECT 'it''s; ok';", &["SELECT 'it''s; ok'"]);
}

#[test]
fn test_double_quotes_hide_semicolons() {
    assert_splits("SELECT \"a;b\" FROM t;", &["SELECT \"a;b\" FROM t"]);
}

#[test]
fn test_multi_line_string() {
    assert_splits(
        "INSERT INTO notes VALUES ('line one;\nline two');",
        &["INSERT INTO notes VALUES ('line one;\nline two')"],
    );
}

#[test]
fn test_unterminated_string_flushed_at_end() {
    assert_splits("SELECT 1;\nSELECT 'dangling", &["SELECT 1", "SELECT 'dangling"]);
}

#[test]
fn test_backtick_is_plain_text() {
    assert_splits("SELECT `a`; SELECT 2;", &["SELECT `a`", "SELECT 2"]);
}
