#![allow(dead_code)]

use oxide_script_core::{Statement, split};

pub fn texts(sql: &str) -> Vec<String> {
    split(sql).into_iter().map(|s| s.text).collect()
}

pub fn rejoin(statements: &[Statement]) -> String {
    statements
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(";")
}

pub fn assert_splits(sql: &str, expected: &[&str]) {
    assert_eq!(texts(sql), expected, "splitting {sql:?}");
}
