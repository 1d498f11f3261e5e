//! Account error types.

use linkshare_crypto::CryptoError;
use linkshare_db::DbError;
use linkshare_referrals::ReferralError;

use crate::validation::ValidationErrors;

/// Errors from account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// One or more registration fields failed validation.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// The store rejected a duplicate username or email.
    #[error("duplicate {field}")]
    Duplicate { field: String },

    #[error("Invalid referral code")]
    InvalidReferralCode,

    #[error("You cannot refer yourself")]
    SelfReferral,

    /// Every generated referral code collided with an existing one.
    #[error("no unique referral code after {0} attempts")]
    ReferralCodeExhausted(u32),

    #[error("referral error: {0}")]
    Referral(#[from] ReferralError),

    #[error("storage error: {0}")]
    Db(#[from] DbError),

    #[error("credential error: {0}")]
    Crypto(#[from] CryptoError),
}

impl AccountError {
    /// Errors a caller can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AccountError::Validation(_)
                | AccountError::Duplicate { .. }
                | AccountError::InvalidReferralCode
                | AccountError::SelfReferral
        )
    }

    /// Field-level errors for the validation-style variants.
    ///
    /// A store-level duplicate is folded into the same message the
    /// validator would have produced for that field.
    pub fn field_errors(&self) -> Option<ValidationErrors> {
        match self {
            AccountError::Validation(errors) => Some(errors.clone()),
            AccountError::Duplicate { field } => {
                let mut errors = ValidationErrors::default();
                errors.insert(field, ValidationErrors::taken_message(field));
                Some(errors)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AccountError>;
