//! Referral ledger structures.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AccountId, ReferralId, RewardId};

/// Status of a referral edge.
///
/// Only `Successful` is written today; `Pending` is reserved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    Pending,
    Successful,
}

impl ReferralStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Successful => "successful",
        }
    }
}

impl fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized referral status text.
#[derive(Debug, thiserror::Error)]
#[error("unknown referral status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ReferralStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "successful" => Ok(Self::Successful),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A recorded referrer -> referred relationship.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralEdge {
    pub id: ReferralId,
    pub referrer_id: AccountId,
    pub referred_id: AccountId,
    pub created_at: u64,
    pub status: ReferralStatus,
}

/// A ledger entry crediting an account for a referral. Append-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardGrant {
    pub id: RewardId,
    /// Beneficiary (the referrer).
    pub account_id: AccountId,
    pub referral_id: ReferralId,
    pub kind: String,
    pub amount: Option<f64>,
    pub created_at: u64,
}

/// Public view of a referred account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferredUser {
    pub id: AccountId,
    pub username: String,
}

/// A referral edge joined with the referred account's public fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralDetail {
    pub edge: ReferralEdge,
    pub referred_user: ReferredUser,
}

/// Aggregate referral statistics for one referrer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralStats {
    pub total_referrals: u64,
    pub successful_referrals: u64,
    /// Number of grants, not the sum of their amounts.
    pub rewards_earned: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        assert_eq!(ReferralStatus::Successful.as_str(), "successful");
        assert_eq!(
            "pending".parse::<ReferralStatus>().expect("parse"),
            ReferralStatus::Pending
        );
        assert!("revoked".parse::<ReferralStatus>().is_err());
    }

    #[test]
    fn test_status_serde_matches_text() {
        let json = serde_json::to_string(&ReferralStatus::Successful).expect("serialize");
        assert_eq!(json, "\"successful\"");
    }

    #[test]
    fn test_stats_field_names() {
        let stats = ReferralStats {
            total_referrals: 2,
            successful_referrals: 2,
            rewards_earned: 1,
        };
        let json = serde_json::to_value(stats).expect("serialize");
        assert_eq!(json["total_referrals"], 2);
        assert_eq!(json["successful_referrals"], 2);
        assert_eq!(json["rewards_earned"], 1);
    }
}
