//! Schema versioning through `PRAGMA user_version`.
//!
//! Version 1 is the only schema so far. A fresh file (version 0) gets it
//! created and stamped in one savepoint; any other version than the current
//! one is refused rather than guessed at.

use rusqlite::Connection;

use crate::{in_savepoint, schema, DbError, Result, SCHEMA_VERSION};

/// Bring `conn` to [`SCHEMA_VERSION`].
pub fn run(conn: &Connection) -> Result<()> {
    let found: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    match found {
        0 => in_savepoint(conn, "schema_init", |c| -> Result<()> {
            tracing::info!("Creating database schema v{SCHEMA_VERSION}");
            c.execute_batch(schema::SCHEMA_V1)?;
            c.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            Ok(())
        }),
        v if v == SCHEMA_VERSION => Ok(()),
        v => Err(DbError::Migration(format!(
            "database is at schema v{v}, this build supports v{SCHEMA_VERSION}"
        ))),
    }
}
