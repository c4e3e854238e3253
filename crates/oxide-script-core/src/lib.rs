//! # oxide-script-core
//!
//! Lexical building blocks for running large multi-statement SQL scripts.
//!
//! This crate provides:
//! - A single-pass, character-scanning statement splitter that understands
//!   quoted strings, backslash escapes, `--` line comments and `/* */` block
//!   comments without needing a SQL grammar
//! - A naive delimiter splitter for scripts known to be free of quoting
//! - A prefix filter that removes statements a batch must not run
//!
//! ## Splitting
//!
//! ```rust
//! use oxide_script_core::split;
//!
//! let statements = split("INSERT INTO t VALUES ('a;b'); -- trailing\nSELECT 1;");
//! let texts: Vec<&str> = statements.iter().map(|s| s.text.as_str()).collect();
//!
//! assert_eq!(texts, vec!["INSERT INTO t VALUES ('a;b')", "SELECT 1"]);
//! ```
//!
//! ## Filtering
//!
//! ```rust
//! use oxide_script_core::{filter, split, DEFAULT_EXCLUDED_PREFIXES};
//!
//! let (kept, removed) = filter(split("DROP TABLE x; SELECT 1;"), &DEFAULT_EXCLUDED_PREFIXES);
//!
//! assert_eq!(removed, 1);
//! assert_eq!(kept[0].text, "SELECT 1");
//! ```

pub mod filter;
pub mod lexer;
pub mod statement;

pub use filter::{DEFAULT_EXCLUDED_PREFIXES, filter, is_excluded};
pub use lexer::{ScanState, Splitter, split, split_on};
pub use statement::{Statement, renumber};
