//! Resilient execution of large multi-statement SQL scripts.
//!
//! `oxide-script` runs dump-sized scripts against a connection that may drop
//! and statements that may fail on their own:
//! - Scripts are split into statements by [`oxide_script_core`]
//! - Statements run strictly in order; a failing statement is recorded and
//!   skipped, never fatal
//! - Connection faults are retried with a bounded reconnect loop
//! - Residual failures are archived to disk, one file per statement, and
//!   re-run for a bounded number of rounds
//!
//! # Architecture
//!
//! - **Connection** - The [`ScriptConnection`](connection::ScriptConnection)
//!   capability, its SQLite implementation and the reconnecting wrapper
//! - **Executor** - Runs a batch and produces an
//!   [`ExecutionOutcome`](executor::ExecutionOutcome)
//! - **Archive** - Writes and reads back archive batches
//! - **Retry** - Re-runs archived failures round by round
//! - **Runner** - Composes everything behind one call
//!
//! # Example
//!
//! ```rust,ignore
//! use oxide_script::prelude::*;
//!
//! let session = SqliteSession::connect("sqlite:app.db").await?;
//! let mut runner = ScriptRunner::new(session, RunnerConfig::default());
//!
//! let summary = runner.run(&RawScript::from_path("dump.sql")?).await?;
//! println!("{summary}");
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Run a script, archiving and retrying failures
//! oxide-script --database sqlite:app.db run dump.sql
//!
//! # Show what would be executed
//! oxide-script split dump.sql
//!
//! # Retry an archive batch left by an earlier run
//! oxide-script --database sqlite:app.db retry fails/dump_2024-03-09_14-05-07
//! ```

pub mod archive;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod retry;
pub mod runner;
pub mod script;

#[cfg(test)]
mod testing;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::archive::{ArchiveBatch, ArchiveMode, Archiver};
    pub use crate::config::{RunnerConfig, SplitMode};
    pub use crate::connection::{ResilientConnection, ScriptConnection, SqlValue, SqliteSession};
    pub use crate::error::{Result, ScriptError};
    pub use crate::executor::{ExecutionOutcome, execute};
    pub use crate::retry::{RetryController, RetryReport, RetrySession, RetryStatus};
    pub use crate::runner::{PreparedScript, RunSummary, ScriptRunner, prepare};
    pub use crate::script::{RawScript, ScriptOrigin};
    pub use oxide_script_core::{Statement, split, split_on};
}
