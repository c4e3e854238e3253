//! Error types for script execution.

use std::path::PathBuf;

use crate::executor::ExecutionOutcome;

/// Errors that can occur while running a script.
///
/// Statement failures are normally absorbed by the executor and only show up
/// here when a caller talks to a connection directly. Archive errors are
/// never absorbed.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Error reported by the database driver.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A statement was rejected by the database.
    #[error("Statement failed: {0}")]
    Statement(String),

    /// The session dropped underneath an operation.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// An operation was issued on a closed session.
    #[error("Not connected")]
    NotConnected,

    /// IO error (reading scripts or configuration).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to read a script file.
    #[error("Failed to read script '{path}': {source}")]
    ScriptRead {
        /// Path to the script.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Failed to write or read an archive of failed statements.
    #[error("Archive error at '{path}': {source}")]
    Archive {
        /// Path being written or read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The given path is not an archive batch directory.
    #[error("Not an archive directory: {0}")]
    InvalidArchive(PathBuf),

    /// Invalid runner configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A run stopped because its failed statements could not be archived.
    #[error(
        "Run aborted with {succeeded} succeeded and {failed} failed statement(s): {source}",
        succeeded = .outcome.succeeded,
        failed = .outcome.failed.len()
    )]
    Aborted {
        /// Outcome of the run up to the point it stopped.
        outcome: Box<ExecutionOutcome>,
        /// The archive error.
        source: Box<ScriptError>,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScriptError {
    /// Returns true if this error means the session died, as opposed to the
    /// statement being wrong.
    ///
    /// Connection faults are worth a reconnect and a second attempt; anything
    /// else would fail the same way again.
    #[must_use]
    pub fn is_connection_fault(&self) -> bool {
        match self {
            Self::Database(err) => matches!(
                err,
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::Protocol(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            Self::ConnectionLost(_) | Self::NotConnected => true,
            _ => false,
        }
    }
}

/// Result type for script operations.
pub type Result<T> = std::result::Result<T, ScriptError>;
