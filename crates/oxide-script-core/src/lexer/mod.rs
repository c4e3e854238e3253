//! Statement splitting.
//!
//! This module provides a hand-written scanner that divides script text into
//! statements on unquoted, uncommented semicolons, plus a naive splitter that
//! cuts on every occurrence of a delimiter.

mod delimited;
mod splitter;
mod state;

pub use delimited::split_on;
pub use splitter::{Splitter, split};
pub use state::ScanState;
