//! Account and credential structures.

use serde::{Deserialize, Serialize};

use crate::{AccountId, ResetTokenId};

/// A registered account.
///
/// `referred_by` is a plain foreign key; resolving the referring account is
/// an explicit lookup by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    /// Argon2id PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Immutable once issued.
    pub referral_code: String,
    pub referred_by: Option<AccountId>,
    pub created_at: u64,
}

impl Account {
    /// Whether this account was created through someone's referral code.
    pub fn was_referred(&self) -> bool {
        self.referred_by.is_some()
    }
}

/// A single-use password reset token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetToken {
    pub id: ResetTokenId,
    pub account_id: AccountId,
    pub token: String,
    pub created_at: u64,
    pub expires_at: u64,
}

impl PasswordResetToken {
    /// A token is expired once `now` is strictly past its expiry.
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_account() -> Account {
        Account {
            id: 7,
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            referral_code: "abcd1234".to_string(),
            referred_by: None,
            created_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(sample_account()).expect("serialize");
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn test_was_referred() {
        let mut account = sample_account();
        assert!(!account.was_referred());
        account.referred_by = Some(1);
        assert!(account.was_referred());
    }

    #[test]
    fn test_token_expiry_boundary() {
        let token = PasswordResetToken {
            id: 1,
            account_id: 7,
            token: "t".to_string(),
            created_at: 100,
            expires_at: 200,
        };
        assert!(!token.is_expired(199));
        // Still usable at the exact expiry second
        assert!(!token.is_expired(200));
        assert!(token.is_expired(201));
    }
}
