//! Tests for comment handling in the splitter.

mod common;
use common::*;

#[test]
fn test_line_comment_before_statement() {
    assert_splits("-- comment\nSELECT 1;", &["SELECT 1"]);
}

#[test]
fn test_block_comment_with_semicolons() {
    assert_splits("/* a; b */ SELECT 2;", &["SELECT 2"]);
}

#[test]
fn test_comment_only_script() {
    assert_splits("-- header\n/* license; text */\n-- footer", &[]);
}

#[test]
fn test_comment_between_statements() {
    assert_splits(
        "CREATE TABLE t (id INT);\n-- seed data;\nINSERT INTO t VALUES (1);",
        &["CREATE TABLE t (id INT)", "INSERT INTO t VALUES (1)"],
    );
}

#[test]
fn test_line_comment_inside_statement_keeps_line_break() {
    assert_splits(
        "SELECT id, -- the key\n  name FROM t;",
        &["SELECT id, \n  name FROM t"],
    );
}

#[test]
fn test_mysql_conditional_comment_is_discarded() {
    assert_splits("/*!40101 SET NAMES utf8 */;\nSELECT 1;", &["SELECT 1"]);
}

#[test]
fn test_block_comment_closing_run_of_stars() {
    assert_splits("/*****/SELECT 3;", &["SELECT 3"]);
}

#[test]
fn test_nested_block_comments_are_not_supported() {
    assert_splits("/* outer /* inner */ SELECT 4;", &["SELECT 4"]);
}
