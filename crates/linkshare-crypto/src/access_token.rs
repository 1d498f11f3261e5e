//! Signed, expiring bearer tokens.
//!
//! Format: `base64url(claims_json) "." base64url(mac)`, where `mac` is the
//! BLAKE3 keyed hash of the encoded claims under a key derived from the
//! server secret with [`contexts::ACCESS_TOKEN_KEY`].

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::blake3::{self, contexts};
use crate::{CryptoError, Result};

/// Claims carried by an access token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the account identifier.
    pub sub: i64,
    /// Issued-at, Unix seconds.
    pub iat: u64,
    /// Expiry, Unix seconds.
    pub exp: u64,
}

/// Issues and verifies access tokens with one server secret.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct TokenSigner {
    key: [u8; 32],
    #[zeroize(skip)]
    ttl_secs: u64,
}

impl TokenSigner {
    /// Build a signer from arbitrary secret material.
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            key: blake3::derive_key(contexts::ACCESS_TOKEN_KEY, secret),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issue a token for `subject`, valid from `now` for the configured TTL.
    pub fn issue(&self, subject: i64, now: u64) -> Result<String> {
        let claims = Claims {
            sub: subject,
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };
        let json =
            serde_json::to_vec(&claims).map_err(|e| CryptoError::Serialization(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let mac = blake3::keyed_hash(&self.key, payload.as_bytes());
        Ok(format!("{payload}.{}", URL_SAFE_NO_PAD.encode(mac)))
    }

    /// Verify a token's MAC and expiry and return its claims.
    pub fn verify(&self, token: &str, now: u64) -> Result<Claims> {
        let (payload, mac_b64) = token
            .split_once('.')
            .ok_or_else(|| CryptoError::InvalidToken("missing separator".to_string()))?;

        let mac: [u8; 32] = URL_SAFE_NO_PAD
            .decode(mac_b64)
            .map_err(|e| CryptoError::InvalidToken(format!("mac encoding: {e}")))?
            .try_into()
            .map_err(|_| CryptoError::InvalidToken("mac must be 32 bytes".to_string()))?;

        let expected = blake3::keyed_hash(&self.key, payload.as_bytes());
        if !blake3::digest_eq(&expected, &mac) {
            return Err(CryptoError::InvalidToken("mac mismatch".to_string()));
        }

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| CryptoError::InvalidToken(format!("payload encoding: {e}")))?;
        let claims: Claims = serde_json::from_slice(&json)
            .map_err(|e| CryptoError::InvalidToken(format!("claims: {e}")))?;

        if now >= claims.exp {
            return Err(CryptoError::TokenExpired {
                expired_at: claims.exp,
            });
        }
        Ok(claims)
    }
}
