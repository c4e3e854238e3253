//! The full pipeline: split, filter, execute, archive, retry.

use std::fmt;
use std::path::PathBuf;

use oxide_script_core::{Splitter, Statement, filter, split_on};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::archive::{ArchiveBatch, Archiver};
use crate::config::{RunnerConfig, SplitMode};
use crate::connection::{ResilientConnection, ScriptConnection};
use crate::error::{Result, ScriptError};
use crate::executor::{ExecutionOutcome, execute};
use crate::retry::{RetryController, RetryReport, RetryStatus};
use crate::script::RawScript;

/// Statements ready to execute, with the counts of what was removed on the
/// way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedScript {
    /// Statements to execute, in script order.
    pub statements: Vec<Statement>,
    /// Statements the splitter produced.
    pub split: usize,
    /// Statements removed by the prefix filter.
    pub filtered: usize,
    /// Statements left empty by pattern stripping.
    pub stripped: usize,
}

/// Splits, filters and strips a script according to `config`.
///
/// Ordinals are the splitter's, so gaps show where statements were removed.
#[must_use]
pub fn prepare(script: &RawScript, config: &RunnerConfig) -> PreparedScript {
    let statements = match config.split_mode {
        SplitMode::Scan => {
            let mut splitter = Splitter::new();
            splitter.feed(script.text());
            let state = splitter.state();
            if state.is_unterminated() {
                warn!(
                    script = script.label(),
                    state = %state,
                    "Script ends unterminated, flushing the remainder as-is"
                );
            }
            splitter.finish()
        }
        SplitMode::Delimiter { delimiter } => split_on(script.text(), delimiter),
    };
    let split = statements.len();

    let (statements, filtered) = filter(statements, &config.excluded_prefixes);

    let mut stripped = 0;
    let statements = if config.strip_patterns.is_empty() {
        statements
    } else {
        statements
            .into_iter()
            .filter_map(|stmt| {
                let text = strip(&stmt.text, &config.strip_patterns);
                if text.is_empty() {
                    stripped += 1;
                    None
                } else {
                    Some(Statement::new(stmt.ordinal, text))
                }
            })
            .collect()
    };

    PreparedScript {
        statements,
        split,
        filtered,
        stripped,
    }
}

/// Logs every failed statement and wraps `source` with the outcome so far.
fn abort(outcome: ExecutionOutcome, source: ScriptError) -> ScriptError {
    error!(
        succeeded = outcome.succeeded,
        failed = outcome.failed.len(),
        error = %source,
        "Archiving failed, run aborted"
    );
    for statement in &outcome.failed {
        error!(ordinal = statement.ordinal, sql = %statement.text, "Unarchived failed statement");
    }
    ScriptError::Aborted {
        outcome: Box::new(outcome),
        source: Box::new(source),
    }
}

fn strip(text: &str, patterns: &[String]) -> String {
    let mut text = text.to_string();
    for pattern in patterns {
        text = text.replace(pattern.as_str(), "");
    }
    text.trim().to_string()
}

/// What a run did, for display or `--json` output.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Label of the script or archive that was run.
    pub source: String,
    pub split: usize,
    pub filtered: usize,
    pub stripped: usize,
    /// Outcome folded over the first pass and every retry round.
    #[serde(flatten)]
    pub outcome: ExecutionOutcome,
    pub retry_rounds: u32,
    /// `None` when no retry was needed or archiving is off.
    pub retry_status: Option<RetryStatus>,
    /// Batch holding the residual failures.
    pub archive_location: Option<PathBuf>,
    /// Reconnects performed during the run.
    pub reconnects: u32,
}

impl RunSummary {
    /// Returns true if every statement eventually succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.outcome.is_clean()
    }

    /// Folds a retry report into a first-pass summary.
    fn absorb(&mut self, report: RetryReport) {
        self.retry_rounds = report.rounds();
        let first = std::mem::take(&mut self.outcome);
        self.outcome = first.then(report.outcome);
        self.retry_status = Some(report.status);
        self.archive_location = report.archive.map(|b| b.directory().to_path_buf());
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} statements, {} excluded, {} stripped",
            self.source, self.split, self.filtered, self.stripped
        )?;
        writeln!(f, "  Succeeded: {}", self.outcome.succeeded)?;
        writeln!(f, "  Failed:    {}", self.outcome.failed.len())?;
        if let Some(status) = self.retry_status {
            let status = match status {
                RetryStatus::Resolved => "resolved",
                RetryStatus::Exhausted => "exhausted",
            };
            writeln!(f, "  Retry:     {} round(s), {status}", self.retry_rounds)?;
        }
        if self.reconnects > 0 {
            writeln!(f, "  Reconnects: {}", self.reconnects)?;
        }
        match &self.archive_location {
            Some(path) => write!(f, "  Archive:   {}", path.display()),
            None => write!(f, "  Archive:   none"),
        }
    }
}

/// Runs scripts against one connection.
#[derive(Debug)]
pub struct ScriptRunner<C> {
    config: RunnerConfig,
    connection: ResilientConnection<C>,
}

impl<C: ScriptConnection> ScriptRunner<C> {
    /// Creates a runner. The connection is wrapped with the configured
    /// reconnect bound.
    pub fn new(connection: C, config: RunnerConfig) -> Self {
        let connection =
            ResilientConnection::new(connection).max_attempts(config.reconnect_attempts);
        Self { config, connection }
    }

    /// Returns the wrapped connection.
    #[must_use]
    pub fn connection(&self) -> &ResilientConnection<C> {
        &self.connection
    }

    /// Consumes the runner and returns the underlying connection.
    pub fn into_connection(self) -> C {
        self.connection.into_inner()
    }

    /// Runs a script end to end.
    ///
    /// Statement failures are archived and retried when archiving is on,
    /// and reported either way. Only archive I/O returns an error, as
    /// [`ScriptError::Aborted`] carrying the first-pass outcome.
    pub async fn run(&mut self, script: &RawScript) -> Result<RunSummary> {
        let prepared = prepare(script, &self.config);
        info!(
            script = script.label(),
            split = prepared.split,
            filtered = prepared.filtered,
            stripped = prepared.stripped,
            "Prepared script"
        );

        let reconnects_before = self.connection.reconnects();
        let outcome = execute(&prepared.statements, &mut self.connection).await;

        let mut summary = RunSummary {
            source: script.label().to_string(),
            split: prepared.split,
            filtered: prepared.filtered,
            stripped: prepared.stripped,
            outcome,
            retry_rounds: 0,
            retry_status: None,
            archive_location: None,
            reconnects: 0,
        };

        if !summary.outcome.is_clean() {
            if self.config.archive_failures {
                let archived = self.archiver().archive(&summary.outcome.failed, script.label());
                let batch = match archived {
                    Ok(batch) => batch,
                    Err(err) => return Err(abort(summary.outcome, err)),
                };
                let report = match self
                    .controller(script.label())
                    .retry(batch, &mut self.connection)
                    .await
                {
                    Ok(report) => report,
                    Err(err) => return Err(abort(summary.outcome, err)),
                };
                summary.absorb(report);
            } else {
                warn!(
                    failed = summary.outcome.failed.len(),
                    "Archiving disabled, failures are not retried"
                );
            }
        }

        summary.reconnects = self.connection.reconnects() - reconnects_before;
        info!(
            succeeded = summary.outcome.succeeded,
            failed = summary.outcome.failed.len(),
            "Run finished"
        );
        Ok(summary)
    }

    /// Runs retry rounds over an existing archive batch.
    pub async fn retry_archive(&mut self, batch: ArchiveBatch, label: &str) -> Result<RunSummary> {
        let reconnects_before = self.connection.reconnects();
        let archived = batch.len();
        let report = self.controller(label).retry(batch, &mut self.connection).await?;
        let retry_rounds = report.rounds();

        Ok(RunSummary {
            source: label.to_string(),
            split: archived,
            filtered: 0,
            stripped: 0,
            outcome: report.outcome,
            retry_rounds,
            retry_status: Some(report.status),
            archive_location: report.archive.map(|b| b.directory().to_path_buf()),
            reconnects: self.connection.reconnects() - reconnects_before,
        })
    }

    fn archiver(&self) -> Archiver {
        Archiver::new(&self.config.archive_root).mode(self.config.archive_mode)
    }

    fn controller(&self, label: &str) -> RetryController {
        let controller =
            RetryController::new(self.archiver(), label).max_attempts(self.config.max_attempts);
        if self.config.reapply_filter_on_retry {
            controller.reapply_filter(self.config.excluded_prefixes.clone())
        } else {
            controller
        }
    }
}
