//! SQL schema definitions.

/// Complete schema for the v1 database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Credential store
-- ============================================================

CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    referral_code TEXT NOT NULL UNIQUE,
    referred_by INTEGER REFERENCES accounts(id),
    created_at INTEGER NOT NULL
);

-- ============================================================
-- Password reset ledger
-- ============================================================

CREATE TABLE IF NOT EXISTS password_resets (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL REFERENCES accounts(id),
    token TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_password_resets_account ON password_resets(account_id);
CREATE INDEX IF NOT EXISTS idx_password_resets_expires ON password_resets(expires_at);

-- ============================================================
-- Referral ledger
-- ============================================================

CREATE TABLE IF NOT EXISTS referral_edges (
    id INTEGER PRIMARY KEY,
    referrer_id INTEGER NOT NULL REFERENCES accounts(id),
    referred_id INTEGER NOT NULL REFERENCES accounts(id),
    created_at INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'successful'
        CHECK (status IN ('pending', 'successful')),
    CHECK (referrer_id <> referred_id),
    UNIQUE (referrer_id, referred_id)
);

CREATE INDEX IF NOT EXISTS idx_referral_edges_referrer ON referral_edges(referrer_id);

-- ============================================================
-- Reward ledger
-- ============================================================

CREATE TABLE IF NOT EXISTS reward_grants (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL REFERENCES accounts(id),
    referral_id INTEGER NOT NULL UNIQUE REFERENCES referral_edges(id),
    kind TEXT NOT NULL,
    amount REAL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reward_grants_account ON reward_grants(account_id);
"#;
