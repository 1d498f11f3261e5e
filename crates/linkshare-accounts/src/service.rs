//! Account service: registration, authentication, password reset.

use linkshare_crypto::argon2id::{self, HashCost};
use linkshare_crypto::random;
use linkshare_db::queries::accounts::{self, NewAccount};
use linkshare_db::queries::password_resets;
use linkshare_db::DbError;
use linkshare_referrals::{ReferralError, ReferralService, RewardPolicy};
use linkshare_types::{
    Account, AccountId, Clock, PasswordResetToken, REFERRAL_CODE_LEN, REFERRAL_CODE_MAX_ATTEMPTS,
    RESET_TOKEN_TTL_SECS,
};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::notify::{Notification, Notifier};
use crate::{AccountError, Result};

/// Tunables for [`AccountService`].
#[derive(Clone, Debug)]
pub struct AccountSettings {
    /// Argon2id cost for new password hashes.
    pub password_cost: HashCost,
    /// Frontend origin; reset links point at `{reset_url_base}/reset-password`.
    pub reset_url_base: String,
    /// Send welcome and referral-success notifications after registration.
    pub signup_notifications: bool,
    pub reward_policy: RewardPolicy,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            password_cost: HashCost::default(),
            reset_url_base: "http://127.0.0.1:5000".to_string(),
            signup_notifications: false,
            reward_policy: RewardPolicy::default(),
        }
    }
}

/// Account operations against one connection.
pub struct AccountService<'a> {
    conn: &'a Connection,
    notifier: &'a dyn Notifier,
    clock: &'a dyn Clock,
    settings: &'a AccountSettings,
}

impl<'a> AccountService<'a> {
    pub fn new(
        conn: &'a Connection,
        notifier: &'a dyn Notifier,
        clock: &'a dyn Clock,
        settings: &'a AccountSettings,
    ) -> Self {
        Self {
            conn,
            notifier,
            clock,
            settings,
        }
    }

    /// Create an account, recording the referral when a code is given.
    ///
    /// Field validation is the caller's job (see
    /// [`crate::validation::validate_registration`]); uniqueness is still
    /// enforced here by the store and reported as [`AccountError::Duplicate`].
    /// An empty referral code means the account was not referred.
    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        referral_code: Option<&str>,
    ) -> Result<Account> {
        let password_hash = argon2id::hash_password(password, &self.settings.password_cost)?;
        self.register_hashed(username, email, &password_hash, referral_code)
    }

    /// [`Self::register`] with the Argon2id hash already computed, so callers
    /// sharing the connection can hash without holding it.
    pub fn register_hashed(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        referral_code: Option<&str>,
    ) -> Result<Account> {
        let referrer = self.resolve_referrer(email, referral_code)?;
        let now = self.clock.now();

        let account = linkshare_db::in_savepoint(self.conn, "register", |conn| {
            let account = insert_with_fresh_code(
                conn,
                NewAccount {
                    username,
                    email,
                    password_hash,
                    referral_code: "",
                    referred_by: referrer.as_ref().map(|r| r.id),
                    created_at: now,
                },
                || random::generate_code(REFERRAL_CODE_LEN),
            )?;

            if let Some(referrer) = &referrer {
                ReferralService::new(conn, self.clock)
                    .with_policy(self.settings.reward_policy.clone())
                    .create_referral_edge(referrer.id, account.id)
                    .map_err(|e| match e {
                        ReferralError::SelfReferral => AccountError::SelfReferral,
                        other => AccountError::Referral(other),
                    })?;
            }
            Ok::<_, AccountError>(account)
        })?;

        info!(
            account_id = account.id,
            referred_by = ?account.referred_by,
            "Account registered"
        );

        if self.settings.signup_notifications {
            self.notify(
                &account.email,
                &Notification::Welcome {
                    username: account.username.clone(),
                },
            );
            if let Some(referrer) = &referrer {
                self.notify(
                    &referrer.email,
                    &Notification::ReferralSuccess {
                        referred_username: account.username.clone(),
                    },
                );
            }
        }

        Ok(account)
    }

    fn resolve_referrer(&self, email: &str, referral_code: Option<&str>) -> Result<Option<Account>> {
        let Some(code) = referral_code.filter(|c| !c.is_empty()) else {
            return Ok(None);
        };
        let referrer = accounts::find_by_referral_code(self.conn, code)?
            .ok_or(AccountError::InvalidReferralCode)?;
        if referrer.email == email {
            return Err(AccountError::SelfReferral);
        }
        Ok(Some(referrer))
    }

    /// Look up by email when the input contains `@`, otherwise by username,
    /// and check the password.
    ///
    /// Unknown accounts and wrong passwords both yield `None`.
    pub fn authenticate(&self, username_or_email: &str, password: &str) -> Result<Option<Account>> {
        let candidate = self.find_login(username_or_email)?;
        check_password(candidate, password, &self.settings.password_cost)
    }

    /// The lookup half of [`Self::authenticate`]. Pass the result to
    /// [`check_password`].
    pub fn find_login(&self, username_or_email: &str) -> Result<Option<Account>> {
        let account = if username_or_email.contains('@') {
            accounts::find_by_email(self.conn, username_or_email)?
        } else {
            accounts::find_by_username(self.conn, username_or_email)?
        };
        Ok(account)
    }

    /// Issue a reset token for the account with this email and send the link.
    ///
    /// Returns `false` without writing anything when no account matches.
    /// A failed notification is logged; the token stays valid.
    pub fn initiate_password_reset(&self, email: &str) -> Result<bool> {
        let Some(account) = accounts::find_by_email(self.conn, email)? else {
            return Ok(false);
        };

        let now = self.clock.now();
        let token = random::generate_reset_token();
        password_resets::insert(
            self.conn,
            account.id,
            &token,
            now,
            now + RESET_TOKEN_TTL_SECS,
        )?;
        info!(account_id = account.id, "Password reset requested");

        let reset_url = format!(
            "{}/reset-password?token={token}",
            self.settings.reset_url_base.trim_end_matches('/')
        );
        self.notify(&account.email, &Notification::PasswordReset { reset_url, token });
        Ok(true)
    }

    /// Replace the password of the token's owner and revoke all of the
    /// owner's reset tokens.
    ///
    /// Unknown or expired tokens return `false` and change nothing.
    pub fn reset_password(&self, token: &str, new_password: &str) -> Result<bool> {
        if self.find_live_reset(token)?.is_none() {
            return Ok(false);
        }
        let password_hash = argon2id::hash_password(new_password, &self.settings.password_cost)?;
        self.complete_reset(token, &password_hash)
    }

    /// The reset token if it exists and has not expired.
    pub fn find_live_reset(&self, token: &str) -> Result<Option<PasswordResetToken>> {
        let Some(reset) = password_resets::find_by_token(self.conn, token)? else {
            return Ok(None);
        };
        if reset.is_expired(self.clock.now()) {
            debug!(account_id = reset.account_id, "Reset token expired");
            return Ok(None);
        }
        Ok(Some(reset))
    }

    /// Store `password_hash` for the owner of `token` and revoke the owner's
    /// reset tokens.
    ///
    /// The token is checked again inside the savepoint, so a token spent or
    /// expired since [`Self::find_live_reset`] returns `false`.
    pub fn complete_reset(&self, token: &str, password_hash: &str) -> Result<bool> {
        let done = linkshare_db::in_savepoint(
            self.conn,
            "reset_password",
            |conn| -> linkshare_db::Result<Option<(AccountId, usize)>> {
                let Some(reset) = password_resets::find_by_token(conn, token)? else {
                    return Ok(None);
                };
                if reset.is_expired(self.clock.now()) {
                    return Ok(None);
                }
                accounts::update_password_hash(conn, reset.account_id, password_hash)?;
                let revoked = password_resets::delete_for_account(conn, reset.account_id)?;
                Ok(Some((reset.account_id, revoked)))
            },
        )?;

        let Some((account_id, revoked)) = done else {
            return Ok(false);
        };
        info!(account_id, revoked, "Password reset completed");
        Ok(true)
    }

    pub fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        Ok(accounts::find(self.conn, id)?)
    }

    /// Delete reset tokens that expired before now.
    pub fn purge_expired_reset_tokens(&self) -> Result<usize> {
        let purged = password_resets::delete_expired(self.conn, self.clock.now())?;
        if purged > 0 {
            info!(purged, "Purged expired reset tokens");
        }
        Ok(purged)
    }

    fn notify(&self, to: &str, notification: &Notification) {
        if let Err(e) = self.notifier.send(to, notification.subject(), notification) {
            warn!(
                template = notification.template_key(),
                "Notification not sent: {e}"
            );
        }
    }
}

/// Check `password` against a [`AccountService::find_login`] result.
///
/// Runs one Argon2 computation whether or not an account was found. Needs no
/// connection, so it can run after the database lock is released.
pub fn check_password(
    candidate: Option<Account>,
    password: &str,
    cost: &HashCost,
) -> Result<Option<Account>> {
    let Some(account) = candidate else {
        argon2id::burn_verification(password, cost);
        debug!("Authentication failed");
        return Ok(None);
    };

    if argon2id::verify_password(password, &account.password_hash)? {
        debug!(account_id = account.id, "Authentication succeeded");
        Ok(Some(account))
    } else {
        debug!(account_id = account.id, "Authentication failed");
        Ok(None)
    }
}

/// Insert `new` with a referral code from `next_code`, regenerating on
/// collision up to [`REFERRAL_CODE_MAX_ATTEMPTS`] times.
fn insert_with_fresh_code(
    conn: &Connection,
    new: NewAccount<'_>,
    mut next_code: impl FnMut() -> String,
) -> Result<Account> {
    for attempt in 1..=REFERRAL_CODE_MAX_ATTEMPTS {
        let code = next_code();
        match accounts::insert(
            conn,
            &NewAccount {
                referral_code: &code,
                ..new
            },
        ) {
            Ok(account) => return Ok(account),
            Err(e) if e.is_unique_violation_on("referral_code") => {
                debug!(attempt, "Referral code collision, regenerating");
            }
            Err(DbError::Unique(field)) => return Err(AccountError::Duplicate { field }),
            Err(e) => return Err(e.into()),
        }
    }
    Err(AccountError::ReferralCodeExhausted(REFERRAL_CODE_MAX_ATTEMPTS))
}
