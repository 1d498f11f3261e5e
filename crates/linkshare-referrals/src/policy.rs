//! Reward policy for successful referrals.

use linkshare_types::{REFERRAL_REWARD_AMOUNT, REWARD_KIND_CREDIT};
use serde::{Deserialize, Serialize};

/// What the referrer receives per successful referral.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardPolicy {
    /// Reward kind tag, e.g. `"credit"`.
    pub kind: String,
    /// Amount per grant; `None` for non-monetary rewards.
    pub amount: Option<f64>,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            kind: REWARD_KIND_CREDIT.to_string(),
            amount: Some(REFERRAL_REWARD_AMOUNT),
        }
    }
}
