//! # linkshare-types
//!
//! Shared domain types used across the LinkShare workspace: accounts,
//! password reset tokens, referral edges and reward grants, plus the policy
//! constants the services enforce.
//!
//! All timestamps are Unix epoch seconds.

pub mod account;
pub mod clock;
pub mod referral;

pub use account::{Account, PasswordResetToken};
pub use clock::{Clock, FixedClock, SystemClock};
pub use referral::{ReferralDetail, ReferralEdge, ReferralStats, ReferralStatus, ReferredUser, RewardGrant};

/// Common identifier aliases. Rows are keyed by SQLite rowids.
pub type AccountId = i64;
pub type ResetTokenId = i64;
pub type ReferralId = i64;
pub type RewardId = i64;

/// Length of a generated referral code, in characters.
pub const REFERRAL_CODE_LEN: usize = 8;

/// How many fresh referral codes registration tries before giving up.
pub const REFERRAL_CODE_MAX_ATTEMPTS: u32 = 5;

/// Password reset token lifetime in seconds (24 hours).
pub const RESET_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// Bearer access token lifetime in seconds (1 hour).
pub const ACCESS_TOKEN_TTL_SECS: u64 = 60 * 60;

/// Reward kind issued for a successful referral.
pub const REWARD_KIND_CREDIT: &str = "credit";

/// Credit granted to the referrer per successful referral.
pub const REFERRAL_REWARD_AMOUNT: f64 = 10.0;

/// Minimum username length.
pub const MIN_USERNAME_LEN: usize = 3;

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 8;
