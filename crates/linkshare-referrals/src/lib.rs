//! # linkshare-referrals
//!
//! Referral edges, reward issuance and referral statistics.
//!
//! - [`service`] - [`ReferralService`]: records edges and issues rewards
//! - [`policy`] - [`RewardPolicy`]: what a successful referral earns
//!
//! ## Reward flow
//!
//! 1. Registration resolves a referral code to the referrer.
//! 2. [`ReferralService::create_referral_edge`] records the edge with status
//!    `successful` and, in the same savepoint, grants the referrer one reward.
//! 3. Statistics count edges and grants; `rewards_earned` is a grant count.

pub mod policy;
pub mod service;

pub use policy::RewardPolicy;
pub use service::ReferralService;

use linkshare_db::DbError;
use linkshare_types::AccountId;

/// Error types for referral operations.
#[derive(Debug, thiserror::Error)]
pub enum ReferralError {
    /// Referrer and referred are the same account.
    #[error("an account cannot refer itself")]
    SelfReferral,

    /// An edge for this pair already exists; no second reward is issued.
    #[error("referral from account {referrer_id} to account {referred_id} already recorded")]
    AlreadyRecorded {
        referrer_id: AccountId,
        referred_id: AccountId,
    },

    /// Storage failure.
    #[error("storage error: {0}")]
    Db(#[from] DbError),
}

pub type Result<T> = std::result::Result<T, ReferralError>;
