//! # linkshare-crypto
//!
//! Credential primitives for the LinkShare service.
//!
//! ## Modules
//!
//! - [`argon2id`] - Salted Argon2id password hashing and verification
//! - [`blake3`] - Domain-separated BLAKE3 key derivation and keyed MACs
//! - [`random`] - Reset tokens, referral codes, salts
//! - [`access_token`] - Signed, expiring bearer tokens

pub mod access_token;
pub mod argon2id;
pub mod blake3;
pub mod random;

/// Error types for credential operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Argon2id hashing failed.
    #[error("argon2id error: {0}")]
    Argon2(String),

    /// A stored password hash could not be parsed.
    #[error("malformed password hash: {0}")]
    MalformedHash(String),

    /// Bearer token is malformed or its MAC does not verify.
    #[error("invalid access token: {0}")]
    InvalidToken(String),

    /// Bearer token is past its expiry.
    #[error("access token expired at {expired_at}")]
    TokenExpired { expired_at: u64 },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
