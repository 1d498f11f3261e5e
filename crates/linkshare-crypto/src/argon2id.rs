//! Argon2id password hashing.
//!
//! Hashes are stored as PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`),
//! so the cost parameters travel with each hash and verification keeps
//! working after the configured cost changes.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::{CryptoError, Result};

/// Default memory cost in KiB (19 MiB).
pub const DEFAULT_M_COST: u32 = 19 * 1024;
/// Default iteration count.
pub const DEFAULT_T_COST: u32 = 2;
/// Default parallelism lanes.
pub const DEFAULT_P_COST: u32 = 1;

/// Argon2id cost parameters used for new hashes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashCost {
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl HashCost {
    pub const fn new(m_cost: u32, t_cost: u32, p_cost: u32) -> Self {
        Self {
            m_cost,
            t_cost,
            p_cost,
        }
    }

    fn hasher(&self) -> Result<Argon2<'static>> {
        let params = Params::new(self.m_cost, self.t_cost, self.p_cost, None)
            .map_err(|e| CryptoError::Argon2(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for HashCost {
    fn default() -> Self {
        Self::new(DEFAULT_M_COST, DEFAULT_T_COST, DEFAULT_P_COST)
    }
}

/// Hash a plaintext password with a fresh random salt.
pub fn hash_password(password: &str, cost: &HashCost) -> Result<String> {
    let salt = SaltString::encode_b64(&crate::random::generate_salt())
        .map_err(|e| CryptoError::Argon2(e.to_string()))?;
    let hash = cost
        .hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CryptoError::Argon2(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC string.
///
/// The comparison inside `argon2` is constant-time. A mismatch is `Ok(false)`;
/// only malformed hashes or hashing failures are errors.
pub fn verify_password(password: &str, phc: &str) -> Result<bool> {
    let parsed = PasswordHash::new(phc).map_err(|e| CryptoError::MalformedHash(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CryptoError::Argon2(e.to_string())),
    }
}

/// Spend one hash worth of work without checking anything.
///
/// Called on lookups that found no account so the response time does not
/// reveal whether the account exists.
pub fn burn_verification(password: &str, cost: &HashCost) {
    let _ = hash_password(password, cost);
}
