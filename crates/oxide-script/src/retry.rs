//! Bounded re-execution of archived failures.
//!
//! Each round reads an archive batch back in ordinal order, splits every file
//! again, and runs the resulting statements. Failures left by a round are
//! archived as a fresh batch, which the next round reads. The loop ends when a
//! round leaves no failures or the round bound is reached; exhaustion is a
//! reported result, not an error.

use oxide_script_core::{Statement, filter, renumber, split};
use serde::Serialize;
use tracing::{info, warn};

use crate::archive::{ArchiveBatch, Archiver};
use crate::connection::ScriptConnection;
use crate::error::Result;
use crate::executor::{ExecutionOutcome, execute};

/// Round counter for one retry run.
///
/// The counter only moves forward and never passes `max_attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetrySession {
    current_attempt: u32,
    max_attempts: u32,
}

impl RetrySession {
    /// Creates a session allowing `max_attempts` rounds.
    #[must_use]
    pub const fn new(max_attempts: u32) -> Self {
        Self {
            current_attempt: 0,
            max_attempts,
        }
    }

    /// Starts the next round. Returns false once the bound is reached.
    pub fn begin_round(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.current_attempt += 1;
        true
    }

    /// Rounds started so far.
    #[must_use]
    pub const fn current_attempt(&self) -> u32 {
        self.current_attempt
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns true if no further round may start.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.current_attempt >= self.max_attempts
    }
}

/// How a retry run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryStatus {
    /// No failures remain.
    Resolved,
    /// The round bound was reached with failures left.
    Exhausted,
}

/// Result of a retry run.
#[derive(Debug, Clone)]
pub struct RetryReport {
    /// Outcome folded over every round.
    pub outcome: ExecutionOutcome,
    /// Final state of the round counter.
    pub session: RetrySession,
    pub status: RetryStatus,
    /// Batch holding exactly the residual failures, if any remain.
    pub archive: Option<ArchiveBatch>,
}

impl RetryReport {
    /// Number of rounds that ran.
    #[must_use]
    pub const fn rounds(&self) -> u32 {
        self.session.current_attempt()
    }
}

/// Re-runs archived failures for a bounded number of rounds.
#[derive(Debug, Clone)]
pub struct RetryController {
    archiver: Archiver,
    label: String,
    max_attempts: u32,
    excluded_prefixes: Option<Vec<String>>,
}

impl RetryController {
    /// Creates a controller that archives residual failures with `archiver`
    /// under batches named after `label`.
    pub fn new(archiver: Archiver, label: impl Into<String>) -> Self {
        Self {
            archiver,
            label: label.into(),
            max_attempts: crate::config::DEFAULT_MAX_ATTEMPTS,
            excluded_prefixes: None,
        }
    }

    /// Sets the round bound. Zero runs no rounds.
    #[must_use]
    pub const fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Drops re-split statements starting with any of `prefixes` before each
    /// round.
    #[must_use]
    pub fn reapply_filter(mut self, prefixes: Vec<String>) -> Self {
        self.excluded_prefixes = Some(prefixes);
        self
    }

    /// Runs retry rounds starting from `batch`.
    ///
    /// Only reading or writing the archive fails the call. Statement errors
    /// and exhausted connection faults end up in the report.
    pub async fn retry<C: ScriptConnection>(
        &self,
        batch: ArchiveBatch,
        connection: &mut C,
    ) -> Result<RetryReport> {
        let mut session = RetrySession::new(self.max_attempts);
        let mut current = batch;
        let mut folded: Option<ExecutionOutcome> = None;

        info!(
            directory = %current.directory().display(),
            statements = current.len(),
            max_attempts = self.max_attempts,
            "Retrying archived failures"
        );

        loop {
            if current.is_empty() {
                break;
            }
            if !session.begin_round() {
                let outcome = match folded {
                    Some(outcome) => outcome,
                    None => ExecutionOutcome::all_failed(self.load(&current)?),
                };
                warn!(
                    rounds = session.current_attempt(),
                    residual = outcome.failed.len(),
                    directory = %current.directory().display(),
                    "Retry attempts exhausted"
                );
                return Ok(RetryReport {
                    outcome,
                    session,
                    status: RetryStatus::Exhausted,
                    archive: Some(current),
                });
            }

            let statements = self.load(&current)?;
            info!(
                round = session.current_attempt(),
                max_attempts = session.max_attempts(),
                statements = statements.len(),
                "Starting retry round"
            );

            let round = execute(&statements, connection).await;
            let residual = if round.is_clean() {
                None
            } else {
                Some(self.archiver.archive(&round.failed, &self.label)?)
            };
            folded = Some(match folded {
                Some(previous) => previous.then(round),
                None => round,
            });

            match residual {
                Some(next) => current = next,
                None => break,
            }
        }

        info!(rounds = session.current_attempt(), "All archived failures resolved");
        Ok(RetryReport {
            outcome: folded.unwrap_or_default(),
            session,
            status: RetryStatus::Resolved,
            archive: None,
        })
    }

    /// Reads `batch` and splits every file into statements.
    fn load(&self, batch: &ArchiveBatch) -> Result<Vec<Statement>> {
        let statements: Vec<Statement> = batch
            .read_statements()?
            .iter()
            .flat_map(|text| split(text))
            .collect();
        let statements = renumber(statements);

        Ok(match &self.excluded_prefixes {
            Some(prefixes) => {
                let (kept, dropped) = filter(statements, prefixes);
                if dropped > 0 {
                    info!(dropped, "Excluded statements from retry round");
                }
                kept
            }
            None => statements,
        })
    }
}
