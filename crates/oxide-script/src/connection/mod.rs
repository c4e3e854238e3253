//! Database connections.
//!
//! A connection only needs to run one statement at a time and be able to
//! drop and re-establish its session. [`ResilientConnection`] adds bounded
//! reconnect-retry on top of any implementation.

mod resilient;
mod sqlite;

pub use resilient::{DEFAULT_RECONNECT_ATTEMPTS, ResilientConnection};
pub use sqlite::SqliteSession;

use serde::Serialize;

use crate::error::Result;

/// A single value returned by [`ScriptConnection::fetch`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// Integer value.
    Integer(i64),
    /// Floating point value.
    Real(f64),
    /// Text value.
    Text(String),
    /// Binary value.
    Blob(Vec<u8>),
}

/// A fetched row.
pub type Row = Vec<SqlValue>;

/// The capability the executor needs from a database session.
///
/// Statement text is passed through verbatim.
#[allow(async_fn_in_trait)]
pub trait ScriptConnection {
    /// Executes a single statement, returning the number of rows affected.
    async fn execute(&mut self, sql: &str) -> Result<u64>;

    /// Executes a query and returns all rows.
    async fn fetch(&mut self, sql: &str) -> Result<Vec<Row>>;

    /// Closes the session.
    async fn disconnect(&mut self) -> Result<()>;

    /// Opens a new session using the last-known configuration.
    async fn reconnect(&mut self) -> Result<()>;
}
