//! Referral ledger queries.

use linkshare_types::{
    AccountId, ReferralDetail, ReferralEdge, ReferralStatus, ReferredUser,
};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};

use crate::{DbError, Result};

/// Record a referral edge.
///
/// A second edge for the same (referrer, referred) pair fails with
/// [`DbError::Unique`]; self-referral fails the table's CHECK.
pub fn insert(
    conn: &Connection,
    referrer_id: AccountId,
    referred_id: AccountId,
    status: ReferralStatus,
    created_at: u64,
) -> Result<ReferralEdge> {
    conn.execute(
        "INSERT INTO referral_edges (referrer_id, referred_id, created_at, status)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![referrer_id, referred_id, created_at as i64, status.as_str()],
    )
    .map_err(DbError::from_write)?;

    Ok(ReferralEdge {
        id: conn.last_insert_rowid(),
        referrer_id,
        referred_id,
        created_at,
        status,
    })
}

/// All edges where `referrer_id` is the referrer, in insertion order.
pub fn list_by_referrer(conn: &Connection, referrer_id: AccountId) -> Result<Vec<ReferralEdge>> {
    let mut stmt = conn.prepare(
        "SELECT id, referrer_id, referred_id, created_at, status
         FROM referral_edges WHERE referrer_id = ?1 ORDER BY id",
    )?;

    let rows = stmt
        .query_map([referrer_id], edge_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Edges of a referrer joined with each referred account's public fields.
pub fn list_details_by_referrer(
    conn: &Connection,
    referrer_id: AccountId,
) -> Result<Vec<ReferralDetail>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.referrer_id, r.referred_id, r.created_at, r.status, a.username
         FROM referral_edges r
         JOIN accounts a ON a.id = r.referred_id
         WHERE r.referrer_id = ?1
         ORDER BY r.id",
    )?;

    let rows = stmt
        .query_map([referrer_id], |row| {
            let edge = edge_from_row(row)?;
            Ok(ReferralDetail {
                referred_user: ReferredUser {
                    id: edge.referred_id,
                    username: row.get(5)?,
                },
                edge,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Number of edges where the account is referrer.
pub fn count_by_referrer(conn: &Connection, referrer_id: AccountId) -> Result<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM referral_edges WHERE referrer_id = ?1",
        [referrer_id],
        |row| row.get(0),
    )?;
    Ok(n as u64)
}

/// Number of the referrer's edges in `status`.
pub fn count_by_referrer_with_status(
    conn: &Connection,
    referrer_id: AccountId,
    status: ReferralStatus,
) -> Result<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM referral_edges WHERE referrer_id = ?1 AND status = ?2",
        rusqlite::params![referrer_id, status.as_str()],
        |row| row.get(0),
    )?;
    Ok(n as u64)
}

fn edge_from_row(row: &Row<'_>) -> rusqlite::Result<ReferralEdge> {
    let status: String = row.get(4)?;
    let status = status
        .parse::<ReferralStatus>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    Ok(ReferralEdge {
        id: row.get(0)?,
        referrer_id: row.get(1)?,
        referred_id: row.get(2)?,
        created_at: row.get::<_, i64>(3)? as u64,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{account, test_db};

    #[test]
    fn test_insert_and_list() {
        let conn = test_db();
        let alice = account(&conn, "alice");
        let bob = account(&conn, "bob");

        let edge = insert(&conn, alice, bob, ReferralStatus::Successful, 500).expect("insert");
        assert_eq!(list_by_referrer(&conn, alice).expect("list"), vec![edge]);
        assert!(list_by_referrer(&conn, bob).expect("list").is_empty());
    }

    #[test]
    fn test_list_in_insertion_order() {
        let conn = test_db();
        let alice = account(&conn, "alice");
        let carol = account(&conn, "carol");
        let bob = account(&conn, "bob");

        insert(&conn, alice, carol, ReferralStatus::Successful, 900).expect("insert");
        insert(&conn, alice, bob, ReferralStatus::Successful, 100).expect("insert");

        let edges = list_by_referrer(&conn, alice).expect("list");
        let referred: Vec<_> = edges.iter().map(|e| e.referred_id).collect();
        assert_eq!(referred, vec![carol, bob]);
        assert!(list_by_referrer(&conn, bob).expect("list").is_empty());
    }

    #[test]
    fn test_details_join_username() {
        let conn = test_db();
        let alice = account(&conn, "alice");
        let bob = account(&conn, "bob");
        insert(&conn, alice, bob, ReferralStatus::Successful, 500).expect("insert");

        let details = list_details_by_referrer(&conn, alice).expect("list");
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].referred_user.username, "bob");
        assert_eq!(details[0].referred_user.id, bob);
    }

    #[test]
    fn test_pair_unique_and_no_self_edge() {
        let conn = test_db();
        let alice = account(&conn, "alice");
        let bob = account(&conn, "bob");
        insert(&conn, alice, bob, ReferralStatus::Successful, 1).expect("insert");

        let dup = insert(&conn, alice, bob, ReferralStatus::Successful, 2).expect_err("dup");
        assert!(dup.is_unique_violation_on("referrer_id,referred_id"), "got {dup:?}");

        let own = insert(&conn, alice, alice, ReferralStatus::Successful, 3).expect_err("self");
        assert!(matches!(own, DbError::Constraint(_)), "got {own:?}");
    }

    #[test]
    fn test_counts_by_status() {
        let conn = test_db();
        let alice = account(&conn, "alice");
        let bob = account(&conn, "bob");
        let carol = account(&conn, "carol");
        insert(&conn, alice, bob, ReferralStatus::Successful, 1).expect("insert");
        insert(&conn, alice, carol, ReferralStatus::Pending, 2).expect("insert");

        assert_eq!(count_by_referrer(&conn, alice).expect("count"), 2);
        assert_eq!(
            count_by_referrer_with_status(&conn, alice, ReferralStatus::Successful).expect("count"),
            1
        );
        assert_eq!(
            count_by_referrer_with_status(&conn, alice, ReferralStatus::Pending).expect("count"),
            1
        );
    }
}
