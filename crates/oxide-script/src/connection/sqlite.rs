//! SQLite sessions.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Connection, Row as _, TypeInfo, ValueRef};
use tracing::{debug, info};

use super::{Row, ScriptConnection, SqlValue};
use crate::error::{Result, ScriptError};

/// A single SQLite connection that can be dropped and re-opened.
///
/// The connect options are kept so a reconnect targets the same database.
pub struct SqliteSession {
    url: String,
    options: SqliteConnectOptions,
    conn: Option<SqliteConnection>,
}

impl SqliteSession {
    /// Opens a session for the given URL (e.g. `sqlite:app.db`).
    ///
    /// The database file is created if it does not exist.
    pub async fn connect(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);
        let conn = SqliteConnection::connect_with(&options).await?;
        info!(url = %url, "Database connection established");

        Ok(Self {
            url,
            options,
            conn: Some(conn),
        })
    }

    /// Returns whether a session is currently open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    fn conn(&mut self) -> Result<&mut SqliteConnection> {
        self.conn.as_mut().ok_or(ScriptError::NotConnected)
    }
}

impl ScriptConnection for SqliteSession {
    async fn execute(&mut self, sql: &str) -> Result<u64> {
        let conn = self.conn()?;
        let result = sqlx::raw_sql(sql).execute(conn).await?;
        Ok(result.rows_affected())
    }

    async fn fetch(&mut self, sql: &str) -> Result<Vec<Row>> {
        let conn = self.conn()?;
        let rows = sqlx::raw_sql(sql).fetch_all(conn).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            debug!(url = %self.url, "Closing database connection");
            conn.close().await?;
        }
        Ok(())
    }

    async fn reconnect(&mut self) -> Result<()> {
        self.disconnect().await?;
        let conn = SqliteConnection::connect_with(&self.options).await?;
        self.conn = Some(conn);
        info!(url = %self.url, "Database connection re-established");
        Ok(())
    }
}

fn decode_row(row: &SqliteRow) -> Result<Row> {
    (0..row.len()).map(|index| decode_value(row, index)).collect()
}

/// Decodes a column by the storage class of its value, not its declared type.
fn decode_value(row: &SqliteRow, index: usize) -> Result<SqlValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let storage = raw.type_info().name().to_string();

    let value = match storage.as_str() {
        "INTEGER" => SqlValue::Integer(row.try_get(index)?),
        "REAL" => SqlValue::Real(row.try_get(index)?),
        "BLOB" => SqlValue::Blob(row.try_get(index)?),
        _ => SqlValue::Text(row.try_get_unchecked(index)?),
    };
    Ok(value)
}
