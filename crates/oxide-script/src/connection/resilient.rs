//! Bounded reconnect-retry around a connection.

use tracing::{debug, error, warn};

use super::{Row, ScriptConnection};
use crate::error::Result;

/// Default number of attempts per operation, reconnects included.
pub const DEFAULT_RECONNECT_ATTEMPTS: u32 = 5;

/// Runs `$call` against the inner connection, reconnecting and trying again
/// on connection faults until the attempt bound is reached.
macro_rules! with_reconnect {
    ($self:ident, $op:literal, |$conn:ident| $call:expr) => {{
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let $conn = &mut $self.inner;
            match $call.await {
                Ok(value) => break Ok(value),
                Err(err) if err.is_connection_fault() && attempt < $self.max_attempts => {
                    warn!(
                        op = $op,
                        attempt,
                        max_attempts = $self.max_attempts,
                        error = %err,
                        "Connection fault, reconnecting"
                    );
                    $self.cycle().await?;
                }
                Err(err) => {
                    if err.is_connection_fault() {
                        error!(
                            op = $op,
                            attempt,
                            max_attempts = $self.max_attempts,
                            error = %err,
                            "Reconnect attempts exhausted"
                        );
                    }
                    break Err(err);
                }
            }
        }
    }};
}

/// Wraps a connection so that a dead session is re-established and the
/// failed call repeated, up to a fixed number of attempts.
///
/// Only connection faults are retried. A statement the database rejects is
/// returned on the first attempt, since running it again would fail the same
/// way.
#[derive(Debug)]
pub struct ResilientConnection<C> {
    inner: C,
    max_attempts: u32,
    reconnects: u32,
}

impl<C: ScriptConnection> ResilientConnection<C> {
    /// Wraps `inner` with the default attempt bound.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            max_attempts: DEFAULT_RECONNECT_ATTEMPTS,
            reconnects: 0,
        }
    }

    /// Sets the attempt bound. Values below one are treated as one.
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Returns how many reconnects this wrapper has performed.
    #[must_use]
    pub fn reconnects(&self) -> u32 {
        self.reconnects
    }

    /// Returns the wrapped connection.
    #[must_use]
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Returns the wrapped connection mutably.
    pub fn inner_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    /// Unwraps the connection.
    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Drops the session and opens a new one.
    ///
    /// A reconnect that itself hits a connection fault is not fatal here; the
    /// next attempt reports the session as unavailable and counts against the
    /// bound.
    async fn cycle(&mut self) -> Result<()> {
        if let Err(err) = self.inner.disconnect().await {
            debug!(error = %err, "Disconnect failed, session already gone");
        }
        match self.inner.reconnect().await {
            Ok(()) => {
                self.reconnects += 1;
                Ok(())
            }
            Err(err) if err.is_connection_fault() => {
                warn!(error = %err, "Reconnect failed");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

impl<C: ScriptConnection> ScriptConnection for ResilientConnection<C> {
    async fn execute(&mut self, sql: &str) -> Result<u64> {
        with_reconnect!(self, "execute", |conn| conn.execute(sql))
    }

    async fn fetch(&mut self, sql: &str) -> Result<Vec<Row>> {
        with_reconnect!(self, "fetch", |conn| conn.fetch(sql))
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.inner.disconnect().await
    }

    async fn reconnect(&mut self) -> Result<()> {
        self.inner.reconnect().await?;
        self.reconnects += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::SqliteSession;
    use crate::error::ScriptError;
    use crate::testing::FakeConnection;

    #[tokio::test]
    async fn test_passes_through_on_success() {
        let mut conn = ResilientConnection::new(FakeConnection::new());
        assert_eq!(conn.execute("SELECT 1").await.unwrap(), 1);
        assert_eq!(conn.reconnects(), 0);
        assert_eq!(conn.inner().executed, vec!["SELECT 1"]);
    }

    #[tokio::test]
    async fn test_reconnects_after_fault() {
        let fake = FakeConnection::new().with_faults(2);
        let mut conn = ResilientConnection::new(fake);

        conn.execute("INSERT INTO t VALUES (1)").await.unwrap();

        assert_eq!(conn.reconnects(), 2);
        assert_eq!(conn.inner().disconnects, 2);
        assert_eq!(conn.inner().executed, vec!["INSERT INTO t VALUES (1)"]);
    }

    #[tokio::test]
    async fn test_gives_up_after_bound() {
        let fake = FakeConnection::new().with_faults(10);
        let mut conn = ResilientConnection::new(fake).max_attempts(3);

        let err = conn.execute("SELECT 1").await.unwrap_err();

        assert!(err.is_connection_fault());
        assert_eq!(conn.inner().calls, 3);
        assert_eq!(conn.reconnects(), 2);
    }

    #[tokio::test]
    async fn test_default_bound_is_five() {
        let fake = FakeConnection::new().with_faults(u32::MAX);
        let mut conn = ResilientConnection::new(fake);

        assert!(conn.execute("SELECT 1").await.is_err());
        assert_eq!(conn.inner().calls, 5);
    }

    #[tokio::test]
    async fn test_statement_error_not_retried() {
        let fake = FakeConnection::new().failing("SELEC 1");
        let mut conn = ResilientConnection::new(fake);

        let err = conn.execute("SELEC 1").await.unwrap_err();

        assert!(matches!(err, ScriptError::Statement(_)));
        assert_eq!(conn.inner().calls, 1);
        assert_eq!(conn.reconnects(), 0);
    }

    #[tokio::test]
    async fn test_failed_reconnect_counts_against_bound() {
        let fake = FakeConnection::new().with_faults(1).with_refused_reconnects(1);
        let mut conn = ResilientConnection::new(fake).max_attempts(3);

        // Attempt 1 faults, reconnect is refused, attempt 2 finds no
        // session, reconnect succeeds, attempt 3 runs.
        conn.execute("SELECT 1").await.unwrap();

        assert_eq!(conn.inner().calls, 3);
        assert_eq!(conn.reconnects(), 1);
    }

    #[tokio::test]
    async fn test_fetch_is_guarded() {
        let fake = FakeConnection::new().with_faults(1);
        let mut conn = ResilientConnection::new(fake);

        let rows = conn.fetch("SELECT COUNT(*) FROM t").await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(conn.reconnects(), 1);
    }

    #[tokio::test]
    async fn test_recovers_closed_sqlite_session() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("resilient.db").display());
        let session = SqliteSession::connect(url).await.unwrap();
        let mut conn = ResilientConnection::new(session);

        conn.execute("CREATE TABLE t (id INTEGER)").await.unwrap();
        conn.inner_mut().disconnect().await.unwrap();

        conn.execute("INSERT INTO t VALUES (1)").await.unwrap();

        assert_eq!(conn.reconnects(), 1);
        assert!(conn.inner().is_connected());
    }
}
