//! Tests for prefix filtering of split scripts.

use oxide_script_core::{DEFAULT_EXCLUDED_PREFIXES, filter, split};

#[test]
fn test_filter_removes_drop() {
    let (kept, removed) = filter(split("DROP TABLE x; SELECT 1;"), &["DROP"]);
    assert_eq!(removed, 1);
    let texts: Vec<&str> = kept.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["SELECT 1"]);
}

#[test]
fn test_filter_dump_preamble() {
    let script = "\
LOCK TABLES `users` WRITE;
DROP TABLE IF EXISTS `users`;
CREATE TABLE `users` (id INT);
INSERT INTO `users` VALUES (1),(2);
UNLOCK TABLES;";
    let (kept, removed) = filter(split(script), &DEFAULT_EXCLUDED_PREFIXES);
    assert_eq!(removed, 3);
    let ordinals: Vec<usize> = kept.iter().map(|s| s.ordinal).collect();
    assert_eq!(ordinals, vec![2, 3]);
}

#[test]
fn test_filter_sees_text_after_comment_removal() {
    // The leading comment is gone by the time prefixes are checked.
    let (kept, removed) = filter(split("/* gen */ DROP TABLE x;"), &["DROP"]);
    assert_eq!(removed, 1);
    assert!(kept.is_empty());
}
