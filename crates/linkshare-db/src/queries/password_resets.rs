//! Password reset ledger queries.

use linkshare_types::{AccountId, PasswordResetToken};
use rusqlite::{Connection, OptionalExtension};

use crate::{DbError, Result};

/// Persist a reset token for an account.
pub fn insert(
    conn: &Connection,
    account_id: AccountId,
    token: &str,
    created_at: u64,
    expires_at: u64,
) -> Result<PasswordResetToken> {
    conn.execute(
        "INSERT INTO password_resets (account_id, token, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![account_id, token, created_at as i64, expires_at as i64],
    )
    .map_err(DbError::from_write)?;

    Ok(PasswordResetToken {
        id: conn.last_insert_rowid(),
        account_id,
        token: token.to_string(),
        created_at,
        expires_at,
    })
}

/// Look up a reset token by its opaque string. Expiry is not checked here.
pub fn find_by_token(conn: &Connection, token: &str) -> Result<Option<PasswordResetToken>> {
    let found = conn
        .query_row(
            "SELECT id, account_id, token, created_at, expires_at
             FROM password_resets WHERE token = ?1",
            [token],
            |row| {
                Ok(PasswordResetToken {
                    id: row.get(0)?,
                    account_id: row.get(1)?,
                    token: row.get(2)?,
                    created_at: row.get::<_, i64>(3)? as u64,
                    expires_at: row.get::<_, i64>(4)? as u64,
                })
            },
        )
        .optional()?;
    Ok(found)
}

/// Delete every outstanding token of an account. Returns the number removed.
pub fn delete_for_account(conn: &Connection, account_id: AccountId) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM password_resets WHERE account_id = ?1",
        [account_id],
    )?;
    Ok(removed)
}

/// Delete tokens that expired before `now`. Returns the number removed.
pub fn delete_expired(conn: &Connection, now: u64) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM password_resets WHERE expires_at < ?1",
        [now as i64],
    )?;
    Ok(removed)
}

/// Number of outstanding tokens for an account.
pub fn count_for_account(conn: &Connection, account_id: AccountId) -> Result<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM password_resets WHERE account_id = ?1",
        [account_id],
        |row| row.get(0),
    )?;
    Ok(n as u64)
}
