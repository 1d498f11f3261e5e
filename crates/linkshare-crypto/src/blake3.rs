//! Domain-separated BLAKE3 helpers.
//!
//! Each keyed use gets its own registered context string so a key derived
//! for one purpose never authenticates data for another.

/// Registered BLAKE3 context strings.
pub mod contexts {
    pub const ACCESS_TOKEN_KEY: &str = "LinkShare v1 access-token-key";

    pub const ALL_CONTEXTS: &[&str] = &[ACCESS_TOKEN_KEY];
}

/// Derive a 32-byte key using BLAKE3's key derivation mode.
pub fn derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    ::blake3::derive_key(context, key_material)
}

/// Keyed BLAKE3 MAC.
pub fn keyed_hash(key: &[u8; 32], message: &[u8]) -> [u8; 32] {
    *::blake3::keyed_hash(key, message).as_bytes()
}

/// Constant-time equality of two 32-byte digests.
pub fn digest_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    ::blake3::Hash::from(*a) == ::blake3::Hash::from(*b)
}

/// Check whether a context string is registered.
pub fn is_registered_context(context: &str) -> bool {
    contexts::ALL_CONTEXTS.contains(&context)
}
