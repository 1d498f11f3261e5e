//! Credential store queries.

use linkshare_types::{Account, AccountId};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::{DbError, Result};

const ACCOUNT_COLUMNS: &str =
    "id, username, email, password_hash, referral_code, referred_by, created_at";

/// Fields of an account before it has an identifier.
#[derive(Debug, Clone)]
pub struct NewAccount<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub referral_code: &'a str,
    pub referred_by: Option<AccountId>,
    pub created_at: u64,
}

/// Insert a new account and return it with its assigned id.
///
/// Duplicate username, email or referral code fails with [`DbError::Unique`].
pub fn insert(conn: &Connection, new: &NewAccount<'_>) -> Result<Account> {
    conn.execute(
        "INSERT INTO accounts (username, email, password_hash, referral_code, referred_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            new.username,
            new.email,
            new.password_hash,
            new.referral_code,
            new.referred_by,
            new.created_at as i64,
        ],
    )
    .map_err(DbError::from_write)?;

    Ok(Account {
        id: conn.last_insert_rowid(),
        username: new.username.to_string(),
        email: new.email.to_string(),
        password_hash: new.password_hash.to_string(),
        referral_code: new.referral_code.to_string(),
        referred_by: new.referred_by,
        created_at: new.created_at,
    })
}

/// Find an account by id.
pub fn find(conn: &Connection, id: AccountId) -> Result<Option<Account>> {
    find_one(conn, "id", &id)
}

/// Find an account by exact username.
pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<Account>> {
    find_one(conn, "username", &username)
}

/// Find an account by exact email.
pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<Account>> {
    find_one(conn, "email", &email)
}

/// Find the account owning a referral code.
pub fn find_by_referral_code(conn: &Connection, code: &str) -> Result<Option<Account>> {
    find_one(conn, "referral_code", &code)
}

pub fn username_exists(conn: &Connection, username: &str) -> Result<bool> {
    exists(conn, "username", username)
}

pub fn email_exists(conn: &Connection, email: &str) -> Result<bool> {
    exists(conn, "email", email)
}

/// Overwrite an account's password hash.
pub fn update_password_hash(conn: &Connection, id: AccountId, password_hash: &str) -> Result<()> {
    let updated = conn.execute(
        "UPDATE accounts SET password_hash = ?1 WHERE id = ?2",
        rusqlite::params![password_hash, id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("account {id}")));
    }
    Ok(())
}

/// Total number of accounts.
pub fn count(conn: &Connection) -> Result<u64> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
    Ok(n as u64)
}

// `column` is always one of the fixed names above, never caller input.
fn find_one(
    conn: &Connection,
    column: &str,
    value: &dyn rusqlite::ToSql,
) -> Result<Option<Account>> {
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {column} = ?1");
    let account = conn
        .query_row(&sql, [value], account_from_row)
        .optional()?;
    Ok(account)
}

fn exists(conn: &Connection, column: &str, value: &str) -> Result<bool> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM accounts WHERE {column} = ?1)");
    let found: bool = conn.query_row(&sql, [value], |row| row.get(0))?;
    Ok(found)
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        referral_code: row.get(4)?,
        referred_by: row.get(5)?,
        created_at: row.get::<_, i64>(6)? as u64,
    })
}
