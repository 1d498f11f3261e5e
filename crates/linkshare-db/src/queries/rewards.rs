//! Reward ledger queries. Grants are append-only.

use linkshare_types::{AccountId, ReferralId, RewardGrant};
use rusqlite::Connection;

use crate::{DbError, Result};

/// Record a reward grant. At most one grant exists per referral.
pub fn insert(
    conn: &Connection,
    account_id: AccountId,
    referral_id: ReferralId,
    kind: &str,
    amount: Option<f64>,
    created_at: u64,
) -> Result<RewardGrant> {
    conn.execute(
        "INSERT INTO reward_grants (account_id, referral_id, kind, amount, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![account_id, referral_id, kind, amount, created_at as i64],
    )
    .map_err(DbError::from_write)?;

    Ok(RewardGrant {
        id: conn.last_insert_rowid(),
        account_id,
        referral_id,
        kind: kind.to_string(),
        amount,
        created_at,
    })
}

/// All grants credited to an account, oldest first.
pub fn list_for_account(conn: &Connection, account_id: AccountId) -> Result<Vec<RewardGrant>> {
    let mut stmt = conn.prepare(
        "SELECT id, account_id, referral_id, kind, amount, created_at
         FROM reward_grants WHERE account_id = ?1 ORDER BY id",
    )?;

    let rows = stmt
        .query_map([account_id], |row| {
            Ok(RewardGrant {
                id: row.get(0)?,
                account_id: row.get(1)?,
                referral_id: row.get(2)?,
                kind: row.get(3)?,
                amount: row.get(4)?,
                created_at: row.get::<_, i64>(5)? as u64,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Number of grants credited to an account.
pub fn count_for_account(conn: &Connection, account_id: AccountId) -> Result<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM reward_grants WHERE account_id = ?1",
        [account_id],
        |row| row.get(0),
    )?;
    Ok(n as u64)
}

/// Sum of grant amounts credited to an account. Grants without an amount count as zero.
pub fn total_amount_for_account(conn: &Connection, account_id: AccountId) -> Result<f64> {
    let total: f64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0.0) FROM reward_grants WHERE account_id = ?1",
        [account_id],
        |row| row.get(0),
    )?;
    Ok(total)
}
