//! Shared server state.

use std::sync::Arc;

use linkshare_accounts::{AccountService, AccountSettings, Notifier};
use linkshare_crypto::access_token::TokenSigner;
use linkshare_crypto::random;
use linkshare_referrals::ReferralService;
use linkshare_types::Clock;
use rusqlite::Connection;
use tracing::warn;

use crate::config::ServerConfig;

/// Server-wide shared state.
pub struct AppState {
    /// Database connection.
    pub db: Arc<tokio::sync::Mutex<Connection>>,
    pub config: ServerConfig,
    pub settings: AccountSettings,
    /// Issues and verifies bearer tokens.
    pub signer: TokenSigner,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        conn: Connection,
        config: ServerConfig,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let signer = if config.auth.token_secret.is_empty() {
            warn!("No token secret configured; tokens will not survive a restart");
            TokenSigner::new(
                &random::generate_secret::<32>(),
                config.auth.access_token_ttl_secs,
            )
        } else {
            TokenSigner::new(
                config.auth.token_secret.as_bytes(),
                config.auth.access_token_ttl_secs,
            )
        };

        Self {
            db: Arc::new(tokio::sync::Mutex::new(conn)),
            settings: config.account_settings(),
            config,
            signer,
            notifier,
            clock,
        }
    }

    /// Account service bound to a locked connection.
    pub fn accounts<'a>(&'a self, conn: &'a Connection) -> AccountService<'a> {
        AccountService::new(conn, self.notifier.as_ref(), self.clock.as_ref(), &self.settings)
    }

    /// Referral service bound to a locked connection.
    pub fn referrals<'a>(&'a self, conn: &'a Connection) -> ReferralService<'a> {
        ReferralService::new(conn, self.clock.as_ref())
            .with_policy(self.settings.reward_policy.clone())
    }
}
