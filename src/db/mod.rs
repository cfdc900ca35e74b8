//! Storage layer.
//!
//! A [`Database`] wraps a libsql database, either a local SQLite file or a
//! remote libsql server. Repository modules expose plain async functions
//! taking an explicit `&Connection`; a [`Transaction`] derefs to one, so
//! the same functions serve reads on a bare connection and writes inside a
//! per-request transaction.
//!
//! ```ignore
//! let tx = state.db.begin().await?;
//! let outcome = async { medications::insert(&tx, patient.id, &caller, &new).await }.await;
//! db::finish(tx, outcome).await
//! ```

pub mod appointments;
pub mod diagnoses;
pub mod goals;
pub mod medications;
pub mod notifications;
pub mod schema;
pub mod users;
pub mod vitals;

use crate::types::{AppError, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use libsql::{Builder, Connection, Row, Rows, Transaction, TransactionBehavior, Value};
use std::path::Path;

/// Milliseconds a connection waits on a locked database before giving up.
const BUSY_TIMEOUT_MS: u32 = 5000;

pub struct Database {
    db: libsql::Database,
    /// In-memory databases only exist per connection, so they share one.
    shared: Option<Connection>,
    local: bool,
}

impl Database {
    /// Opens the database at `url`.
    ///
    /// `libsql://`, `http://` and `https://` URLs connect to a remote libsql
    /// server with `auth_token`; anything else is a local file path
    /// (optionally prefixed with `file:`) or `:memory:`.
    pub async fn open(url: &str, auth_token: Option<String>) -> Result<Self> {
        if is_remote(url) {
            let db = Builder::new_remote(url.to_string(), auth_token.unwrap_or_default())
                .build()
                .await
                .map_err(|e| AppError::Database(format!("Failed to connect to {}: {}", url, e)))?;

            tracing::info!(url, "connected to remote database");
            return Ok(Self {
                db,
                shared: None,
                local: false,
            });
        }

        let path = url.strip_prefix("file:").unwrap_or(url);
        if path != ":memory:"
            && let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Database(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open {}: {}", path, e)))?;

        let mut database = Self {
            db,
            shared: None,
            local: true,
        };

        if path == ":memory:" {
            let conn = database.connect_configured().await?;
            database.shared = Some(conn);
        } else {
            let conn = database.connect_configured().await?;
            let mut rows = conn.query("PRAGMA journal_mode = WAL", ()).await?;
            rows.next().await?;
        }

        tracing::info!(path, "opened local database");
        Ok(database)
    }

    /// A connection with foreign keys enforced.
    pub async fn connection(&self) -> Result<Connection> {
        match &self.shared {
            Some(conn) => Ok(conn.clone()),
            None => self.connect_configured().await,
        }
    }

    /// Starts a write transaction.
    ///
    /// The write lock is taken up front so concurrent requests queue on
    /// the busy timeout instead of failing on lock upgrade.
    pub async fn begin(&self) -> Result<Transaction> {
        let conn = self.connection().await?;
        let behavior = if self.local {
            TransactionBehavior::Immediate
        } else {
            TransactionBehavior::Deferred
        };

        conn.transaction_with_behavior(behavior)
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))
    }

    /// Applies pending schema migrations.
    pub async fn migrate(&self) -> Result<usize> {
        let conn = self.connection().await?;
        schema::migrate(&conn).await
    }

    async fn connect_configured(&self) -> Result<Connection> {
        let conn = self
            .db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        if self.local {
            conn.execute("PRAGMA foreign_keys = ON", ()).await?;
            let mut rows = conn
                .query(&format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS), ())
                .await?;
            rows.next().await?;
        }

        Ok(conn)
    }
}

fn is_remote(url: &str) -> bool {
    ["libsql://", "http://", "https://"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

/// Commits `tx` when `outcome` is `Ok`, otherwise rolls it back and
/// passes the error through.
pub async fn finish<T>(tx: Transaction, outcome: Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| AppError::Database(format!("Failed to commit: {}", e)))?;
            Ok(value)
        }
        Err(err) => {
            tracing::warn!(error = %err, "rolling back transaction");
            if let Err(e) = tx.rollback().await {
                tracing::error!(error = %e, "rollback failed");
            }
            Err(err)
        }
    }
}

// ============= Column Helpers =============

/// Current time at the precision stored in the database.
pub(crate) fn now() -> DateTime<Utc> {
    let now = Utc::now();
    parse_timestamp(&timestamp(&now)).unwrap_or(now)
}

/// Timestamps are stored as fixed-width RFC 3339 text so that string
/// comparison matches chronological order.
pub(crate) fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| AppError::Database(format!("Invalid timestamp '{}': {}", value, e)))
}

pub(crate) fn date(value: &NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| AppError::Database(format!("Invalid date '{}': {}", value, e)))
}

pub(crate) fn text(value: impl Into<String>) -> Value {
    Value::Text(value.into())
}

pub(crate) fn opt_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |v| Value::Text(v.to_string()))
}

pub(crate) fn flag(value: bool) -> Value {
    Value::Integer(i64::from(value))
}

pub(crate) fn get_flag(row: &Row, idx: i32) -> Result<bool> {
    Ok(row.get::<i64>(idx)? != 0)
}

pub(crate) fn get_timestamp(row: &Row, idx: i32) -> Result<DateTime<Utc>> {
    parse_timestamp(&row.get::<String>(idx)?)
}

pub(crate) fn get_opt_timestamp(row: &Row, idx: i32) -> Result<Option<DateTime<Utc>>> {
    row.get::<Option<String>>(idx)?
        .as_deref()
        .map(parse_timestamp)
        .transpose()
}

pub(crate) fn get_date(row: &Row, idx: i32) -> Result<NaiveDate> {
    parse_date(&row.get::<String>(idx)?)
}

pub(crate) fn get_opt_date(row: &Row, idx: i32) -> Result<Option<NaiveDate>> {
    row.get::<Option<String>>(idx)?
        .as_deref()
        .map(parse_date)
        .transpose()
}

pub(crate) fn params(values: Vec<Value>) -> libsql::params::Params {
    libsql::params::Params::Positional(values)
}

/// Runs a single-row `INSERT`/`UPDATE ... RETURNING` statement.
///
/// Constraint failures can surface either when the statement is started or
/// on its first step, so `on_error` is applied to both.
pub(crate) async fn returning<T>(
    conn: &Connection,
    sql: &str,
    values: Vec<Value>,
    on_error: impl Fn(libsql::Error) -> AppError,
    map: impl Fn(&Row) -> Result<T>,
) -> Result<Option<T>> {
    let mut rows = conn.query(sql, params(values)).await.map_err(&on_error)?;
    match rows.next().await.map_err(&on_error)? {
        Some(row) => map(&row).map(Some),
        None => Ok(None),
    }
}

/// Maps every remaining row.
pub(crate) async fn collect<T>(mut rows: Rows, map: impl Fn(&Row) -> Result<T>) -> Result<Vec<T>> {
    let mut items = Vec::new();
    while let Some(row) = rows.next().await? {
        items.push(map(&row)?);
    }
    Ok(items)
}

/// Maps the first row, if any.
pub(crate) async fn first<T>(mut rows: Rows, map: impl Fn(&Row) -> Result<T>) -> Result<Option<T>> {
    match rows.next().await? {
        Some(row) => map(&row).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn is_unique_violation(err: &libsql::Error) -> bool {
    err.to_string().contains("UNIQUE constraint failed")
}

pub(crate) fn is_foreign_key_violation(err: &libsql::Error) -> bool {
    err.to_string().contains("FOREIGN KEY constraint failed")
}
