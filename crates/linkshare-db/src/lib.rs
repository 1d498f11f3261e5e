//! # linkshare-db
//!
//! Storage layer for the LinkShare service: one SQLite database holding the
//! credential store and the password-reset, referral and reward ledgers.
//!
//! ## Schema
//!
//! - WAL mode, foreign keys enforced
//! - All timestamps are Unix epoch seconds
//! - Uniqueness (username, email, referral code, reset token, referral pair,
//!   reward per referral) is enforced by the store, not by callers
//! - Schema version stored in `PRAGMA user_version`
//!
//! Query functions take an explicit `&Connection`. A `rusqlite::Transaction`
//! derefs to `Connection`, so the same functions compose inside a transaction.

pub mod migrations;
pub mod queries;
pub mod schema;

use rusqlite::Connection;
use std::path::Path;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A UNIQUE constraint rejected the write. Holds the column name(s).
    #[error("duplicate value for {0}")]
    Unique(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl DbError {
    /// Classify a write error, splitting out constraint violations.
    pub fn from_write(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, Some(msg))
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                match msg.strip_prefix("UNIQUE constraint failed: ") {
                    Some(columns) => DbError::Unique(unqualified_columns(columns)),
                    None => DbError::Constraint(msg),
                }
            }
            other => DbError::Sqlite(other),
        }
    }

    /// Whether this is a uniqueness violation on exactly `column`.
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        matches!(self, DbError::Unique(c) if c == column)
    }
}

/// `"accounts.email"` -> `"email"`; `"t.a, t.b"` -> `"a,b"`.
fn unqualified_columns(columns: &str) -> String {
    columns
        .split(", ")
        .map(|c| c.rsplit('.').next().unwrap_or(c))
        .collect::<Vec<_>>()
        .join(",")
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open or create the database at the given path.
///
/// Configures WAL mode, foreign keys, and runs any pending migrations.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing).
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Run `f` inside a named savepoint.
///
/// Outside a transaction the savepoint opens one and `RELEASE` commits it;
/// inside a transaction it nests. Any error from `f`, or from the final
/// `RELEASE`, rolls back every write `f` made before the error is returned.
pub fn in_savepoint<T, E>(
    conn: &Connection,
    name: &str,
    f: impl FnOnce(&Connection) -> std::result::Result<T, E>,
) -> std::result::Result<T, E>
where
    E: From<DbError>,
{
    conn.execute_batch(&format!("SAVEPOINT {name}"))
        .map_err(|e| E::from(DbError::Sqlite(e)))?;

    let outcome = f(conn).and_then(|value| {
        // An outermost RELEASE commits, so it can still fail on a deferred constraint.
        match conn.execute_batch(&format!("RELEASE {name}")) {
            Ok(()) => Ok(value),
            Err(e) => Err(E::from(DbError::from_write(e))),
        }
    });
    if outcome.is_err() {
        roll_back(conn, name);
    }
    outcome
}

/// Undo and close savepoint `name`. Failures are logged; the caller
/// already has an error to report.
fn roll_back(conn: &Connection, name: &str) {
    if let Err(rollback) = conn.execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name}")) {
        tracing::error!(savepoint = name, "Rollback failed: {rollback}");
    }
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use linkshare_types::AccountId;
    use rusqlite::Connection;

    use crate::queries::accounts::{self, NewAccount};

    pub fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    /// Insert a minimal account named `name` and return its id.
    pub fn account(conn: &Connection, name: &str) -> AccountId {
        accounts::insert(
            conn,
            &NewAccount {
                username: name,
                email: &format!("{name}@x.com"),
                password_hash: "$argon2id$test",
                referral_code: &format!("code-{name}"),
                referred_by: None,
                created_at: 1_000,
            },
        )
        .expect("insert account")
        .id
    }
}
