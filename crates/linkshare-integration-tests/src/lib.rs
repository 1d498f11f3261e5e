//! Integration test crate for the LinkShare service.
//!
//! Scenarios under `tests/` drive the account, referral and API layers
//! together against an in-memory database, without binding a socket.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p linkshare-integration-tests
//! ```

use std::sync::Arc;

use linkshare_accounts::OutboxNotifier;
use linkshare_crypto::argon2id::HashCost;
use linkshare_server::{AppState, ServerConfig};
use linkshare_types::FixedClock;

/// Base timestamp for test scenarios.
pub const BASE_TIME: u64 = 1_700_000_000;

/// Cheap Argon2id parameters for test speed.
pub const TEST_COST: HashCost = HashCost::new(1024, 1, 1);

/// A server state wired to an outbox notifier and a manual clock.
pub struct Harness {
    pub state: Arc<AppState>,
    pub outbox: Arc<OutboxNotifier>,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Build a harness after adjusting the default test configuration.
    pub fn with_config(adjust: impl FnOnce(&mut ServerConfig)) -> Self {
        let mut config = ServerConfig::default();
        config.auth.token_secret = "integration-secret".to_string();
        config.security.argon2_m_cost = TEST_COST.m_cost;
        config.security.argon2_t_cost = TEST_COST.t_cost;
        config.security.argon2_p_cost = TEST_COST.p_cost;
        config.mail.frontend_url = "http://frontend.test".to_string();
        adjust(&mut config);

        let conn = linkshare_db::open_memory().expect("open in-memory database");
        let outbox = Arc::new(OutboxNotifier::new());
        let clock = Arc::new(FixedClock::new(BASE_TIME));
        let state = Arc::new(AppState::new(conn, config, outbox.clone(), clock.clone()));
        Self {
            state,
            outbox,
            clock,
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// `Authorization` header value for the token in a login/register reply.
pub fn bearer_header(body: &serde_json::Value) -> String {
    format!(
        "Bearer {}",
        body["access_token"].as_str().expect("reply carries access_token")
    )
}
