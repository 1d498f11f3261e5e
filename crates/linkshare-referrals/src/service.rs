//! Referral service: edge creation, reward issuance, statistics.

use linkshare_db::queries::{referrals, rewards};
use linkshare_db::DbError;
use linkshare_types::{
    AccountId, Clock, ReferralDetail, ReferralEdge, ReferralStats, ReferralStatus, RewardGrant,
};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::{ReferralError, Result, RewardPolicy};

/// Referral operations against one connection.
pub struct ReferralService<'a> {
    conn: &'a Connection,
    clock: &'a dyn Clock,
    policy: RewardPolicy,
}

impl<'a> ReferralService<'a> {
    pub fn new(conn: &'a Connection, clock: &'a dyn Clock) -> Self {
        Self {
            conn,
            clock,
            policy: RewardPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RewardPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Record that `referrer_id` referred `referred_id` and reward the referrer.
    ///
    /// The edge is always written with status `successful`. Exactly one
    /// reward grant accompanies it; both writes commit or neither does.
    /// Recording the same pair twice fails with
    /// [`ReferralError::AlreadyRecorded`] and grants nothing.
    pub fn create_referral_edge(
        &self,
        referrer_id: AccountId,
        referred_id: AccountId,
    ) -> Result<ReferralEdge> {
        if referrer_id == referred_id {
            return Err(ReferralError::SelfReferral);
        }

        let now = self.clock.now();
        let (edge, grant) = linkshare_db::in_savepoint(self.conn, "referral_edge", |conn| {
            let edge = referrals::insert(
                conn,
                referrer_id,
                referred_id,
                ReferralStatus::Successful,
                now,
            )
            .map_err(|e| match e {
                DbError::Unique(_) => ReferralError::AlreadyRecorded {
                    referrer_id,
                    referred_id,
                },
                other => ReferralError::Db(other),
            })?;
            let grant = self.issue_reward(conn, &edge, now)?;
            Ok::<_, ReferralError>((edge, grant))
        })?;

        info!(
            referral_id = edge.id,
            referrer_id, referred_id, "Referral recorded"
        );
        debug!(
            reward_id = grant.id,
            kind = %grant.kind,
            amount = ?grant.amount,
            "Referral reward granted"
        );
        Ok(edge)
    }

    fn issue_reward(&self, conn: &Connection, edge: &ReferralEdge, now: u64) -> Result<RewardGrant> {
        let grant = rewards::insert(
            conn,
            edge.referrer_id,
            edge.id,
            &self.policy.kind,
            self.policy.amount,
            now,
        )?;
        Ok(grant)
    }

    /// Edges where the account is the referrer, in creation order.
    pub fn list_referrals_of(&self, account_id: AccountId) -> Result<Vec<ReferralEdge>> {
        Ok(referrals::list_by_referrer(self.conn, account_id)?)
    }

    /// Like [`Self::list_referrals_of`], with each referred account's public fields.
    pub fn list_referral_details(&self, account_id: AccountId) -> Result<Vec<ReferralDetail>> {
        Ok(referrals::list_details_by_referrer(self.conn, account_id)?)
    }

    /// Referral statistics for an account.
    pub fn stats_for(&self, account_id: AccountId) -> Result<ReferralStats> {
        Ok(ReferralStats {
            total_referrals: referrals::count_by_referrer(self.conn, account_id)?,
            successful_referrals: referrals::count_by_referrer_with_status(
                self.conn,
                account_id,
                ReferralStatus::Successful,
            )?,
            rewards_earned: rewards::count_for_account(self.conn, account_id)?,
        })
    }

    /// Reward grants credited to an account.
    pub fn rewards_of(&self, account_id: AccountId) -> Result<Vec<RewardGrant>> {
        Ok(rewards::list_for_account(self.conn, account_id)?)
    }

    /// Sum of reward amounts credited to an account.
    pub fn reward_total(&self, account_id: AccountId) -> Result<f64> {
        Ok(rewards::total_amount_for_account(self.conn, account_id)?)
    }
}
