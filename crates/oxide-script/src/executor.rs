//! Statement executor.
//!
//! This module runs statements one by one against a connection. A failing
//! statement is recorded and skipped; it never stops the batch.

use oxide_script_core::Statement;
use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::connection::ScriptConnection;

/// Result of executing a batch of statements.
///
/// `succeeded + failed.len() == attempted` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionOutcome {
    /// Statements handed to the connection.
    pub attempted: usize,
    /// Statements that ran without error.
    pub succeeded: usize,
    /// Statements that failed, in execution order.
    #[serde(serialize_with = "serialize_statements")]
    pub failed: Vec<Statement>,
}

impl ExecutionOutcome {
    /// Creates an empty outcome.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an outcome in which every statement failed.
    #[must_use]
    pub fn all_failed(statements: Vec<Statement>) -> Self {
        Self {
            attempted: statements.len(),
            succeeded: 0,
            failed: statements,
        }
    }

    /// Records a successful statement.
    pub fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    /// Records a failed statement.
    pub fn record_failure(&mut self, statement: Statement) {
        self.attempted += 1;
        self.failed.push(statement);
    }

    /// Returns true if nothing failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Folds a later round over the failures of this one into a combined
    /// outcome.
    ///
    /// Successes accumulate, the failure list is the later round's, and
    /// `attempted` is recomputed so the counts stay consistent even when the
    /// later round re-split failures into a different number of statements.
    #[must_use]
    pub fn then(self, next: Self) -> Self {
        Self {
            attempted: self.succeeded + next.attempted,
            succeeded: self.succeeded + next.succeeded,
            failed: next.failed,
        }
    }
}

fn serialize_statements<S: Serializer>(
    statements: &[Statement],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct Record<'a> {
        ordinal: usize,
        text: &'a str,
    }

    serializer.collect_seq(statements.iter().map(|stmt| Record {
        ordinal: stmt.ordinal,
        text: &stmt.text,
    }))
}

/// Executes statements strictly in order, continuing past failures.
///
/// Any error from the connection, including a connection fault that outlived
/// the connection's own retry, marks that statement failed and moves on.
pub async fn execute<C: ScriptConnection>(
    statements: &[Statement],
    connection: &mut C,
) -> ExecutionOutcome {
    info!(statements = statements.len(), "Executing statements");

    let mut outcome = ExecutionOutcome::new();
    for statement in statements {
        debug!(ordinal = statement.ordinal, sql = %statement.text, "Executing SQL");

        match connection.execute(&statement.text).await {
            Ok(_) => outcome.record_success(),
            Err(err) => {
                warn!(
                    ordinal = statement.ordinal,
                    error = %err,
                    "Statement failed, continuing"
                );
                outcome.record_failure(statement.clone());
            }
        }
    }

    info!(
        succeeded = outcome.succeeded,
        failed = outcome.failed.len(),
        "Batch finished"
    );

    outcome
}
