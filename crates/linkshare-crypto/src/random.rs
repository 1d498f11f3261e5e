//! Random identifiers: salts, reset tokens and referral codes.

use rand::RngCore;

/// Generate a random 16-byte salt.
pub fn generate_salt() -> [u8; 16] {
    let mut salt = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

/// Generate an opaque password reset token (256 bits, lowercase hex).
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generate a lowercase hex code of exactly `len` characters.
pub fn generate_code(len: usize) -> String {
    let mut bytes = vec![0u8; len.div_ceil(2)];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let mut code = hex::encode(bytes);
    code.truncate(len);
    code
}

/// Generate a random secret of `N` bytes.
pub fn generate_secret<const N: usize>() -> [u8; N] {
    let mut secret = [0u8; N];
    rand::rngs::OsRng.fill_bytes(&mut secret);
    secret
}
