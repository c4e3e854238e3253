//! Scripted in-memory connection for tests.

use std::collections::{HashMap, HashSet};

use crate::connection::{Row, ScriptConnection, SqlValue};
use crate::error::{Result, ScriptError};

/// A connection whose behaviour is set up front.
///
/// - statements in `failing` are always rejected
/// - a statement with a prerequisite is rejected until the prerequisite has
///   been applied
/// - the next `faults` calls drop the session
#[derive(Debug)]
pub(crate) struct FakeConnection {
    /// Statements applied successfully, in order.
    pub executed: Vec<String>,
    /// Number of execute/fetch calls made.
    pub calls: u32,
    pub disconnects: u32,
    pub reconnects: u32,
    connected: bool,
    faults: u32,
    refused_reconnects: u32,
    failing: HashSet<String>,
    prerequisites: HashMap<String, String>,
}

impl FakeConnection {
    pub fn new() -> Self {
        Self {
            executed: Vec::new(),
            calls: 0,
            disconnects: 0,
            reconnects: 0,
            connected: true,
            faults: 0,
            refused_reconnects: 0,
            failing: HashSet::new(),
            prerequisites: HashMap::new(),
        }
    }

    pub fn failing(mut self, sql: &str) -> Self {
        self.failing.insert(sql.to_string());
        self
    }

    /// `sql` only succeeds once `prerequisite` has been applied.
    pub fn requires(mut self, sql: &str, prerequisite: &str) -> Self {
        self.prerequisites
            .insert(sql.to_string(), prerequisite.to_string());
        self
    }

    pub fn with_faults(mut self, faults: u32) -> Self {
        self.faults = faults;
        self
    }

    pub fn with_refused_reconnects(mut self, refused: u32) -> Self {
        self.refused_reconnects = refused;
        self
    }

    /// Number of successful applications of `sql`.
    pub fn applied(&self, sql: &str) -> usize {
        self.executed.iter().filter(|s| *s == sql).count()
    }

    fn run(&mut self, sql: &str) -> Result<()> {
        self.calls += 1;
        if !self.connected {
            return Err(ScriptError::NotConnected);
        }
        if self.faults > 0 {
            self.faults -= 1;
            self.connected = false;
            return Err(ScriptError::ConnectionLost("server has gone away".into()));
        }
        if self.failing.contains(sql) {
            return Err(ScriptError::Statement(format!("syntax error near '{sql}'")));
        }
        if let Some(prerequisite) = self.prerequisites.get(sql) {
            if !self.executed.contains(prerequisite) {
                return Err(ScriptError::Statement(format!(
                    "'{sql}' needs '{prerequisite}' first"
                )));
            }
        }
        self.executed.push(sql.to_string());
        Ok(())
    }
}

impl ScriptConnection for FakeConnection {
    async fn execute(&mut self, sql: &str) -> Result<u64> {
        self.run(sql)?;
        Ok(1)
    }

    async fn fetch(&mut self, sql: &str) -> Result<Vec<Row>> {
        self.run(sql)?;
        let count = i64::try_from(self.executed.len()).unwrap_or(i64::MAX);
        Ok(vec![vec![SqlValue::Integer(count)]])
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.disconnects += 1;
        self.connected = false;
        Ok(())
    }

    async fn reconnect(&mut self) -> Result<()> {
        if self.refused_reconnects > 0 {
            self.refused_reconnects -= 1;
            return Err(ScriptError::ConnectionLost("connection refused".into()));
        }
        self.reconnects += 1;
        self.connected = true;
        Ok(())
    }
}
