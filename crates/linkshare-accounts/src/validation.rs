//! Registration and password-strength rules.
//!
//! Rules run in a fixed order per field and a later failure overwrites an
//! earlier one, so "taken" wins over "too short" for the username and
//! "already registered" wins over "invalid format" for the email.

use std::collections::BTreeMap;
use std::fmt;

use linkshare_db::queries::accounts;
use linkshare_types::{MIN_PASSWORD_LEN, MIN_USERNAME_LEN};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{AccountError, Result};

pub const USERNAME_TOO_SHORT: &str = "Username must be at least 3 characters long";
pub const USERNAME_TAKEN: &str = "Username is already taken";
pub const EMAIL_INVALID: &str = "Invalid email format";
pub const EMAIL_TAKEN: &str = "Email is already registered";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters long";
pub const PASSWORD_NO_UPPER: &str = "Password must contain at least one uppercase letter";
pub const PASSWORD_NO_LOWER: &str = "Password must contain at least one lowercase letter";
pub const PASSWORD_NO_DIGIT: &str = "Password must contain at least one digit";

/// Field name to message, ordered by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    /// Set the message for `field`, replacing any earlier one.
    pub fn insert(&mut self, field: &str, message: &str) {
        self.0.insert(field.to_string(), message.to_string());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Message used when the store reports `field` as already taken.
    pub fn taken_message(field: &str) -> &'static str {
        match field {
            "email" => EMAIL_TAKEN,
            "username" => USERNAME_TAKEN,
            _ => "Value is already in use",
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Check every registration field, including uniqueness against the store.
///
/// Returns [`AccountError::Validation`] carrying all failing fields at once.
pub fn validate_registration(
    conn: &Connection,
    username: &str,
    email: &str,
    password: &str,
) -> Result<()> {
    let mut errors = ValidationErrors::default();

    if username.chars().count() < MIN_USERNAME_LEN {
        errors.insert("username", USERNAME_TOO_SHORT);
    }
    if accounts::username_exists(conn, username)? {
        errors.insert("username", USERNAME_TAKEN);
    }

    if !is_valid_email(email) {
        errors.insert("email", EMAIL_INVALID);
    }
    if accounts::email_exists(conn, email)? {
        errors.insert("email", EMAIL_TAKEN);
    }

    if let Err(message) = validate_password_strength(password) {
        errors.insert("password", message);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AccountError::Validation(errors))
    }
}

/// Password policy: length, then uppercase, lowercase and digit, first failure wins.
pub fn validate_password_strength(password: &str) -> std::result::Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PASSWORD_TOO_SHORT);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PASSWORD_NO_UPPER);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(PASSWORD_NO_LOWER);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PASSWORD_NO_DIGIT);
    }
    Ok(())
}

/// `local@domain.tld` where local and domain use word characters, `.` or `-`,
/// and the final label is word characters only.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || !local.chars().all(is_local_char) {
        return false;
    }
    if domain.contains('@') || !domain.chars().all(is_local_char) {
        return false;
    }
    // Any dot may separate host from tld as long as both sides are non-empty
    // and the tld is pure word characters.
    domain.char_indices().any(|(i, c)| {
        c == '.' && i > 0 && {
            let tld = &domain[i + 1..];
            !tld.is_empty() && tld.chars().all(is_word_char)
        }
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_local_char(c: char) -> bool {
    is_word_char(c) || c == '.' || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkshare_db::queries::accounts::NewAccount;

    fn seed(conn: &Connection, username: &str, email: &str) {
        accounts::insert(
            conn,
            &NewAccount {
                username,
                email,
                password_hash: "$argon2id$test",
                referral_code: &format!("code-{username}"),
                referred_by: None,
                created_at: 0,
            },
        )
        .expect("seed account");
    }

    fn errors_of(result: Result<()>) -> ValidationErrors {
        match result {
            Err(AccountError::Validation(errors)) => errors,
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_registration() {
        let conn = linkshare_db::open_memory().expect("db");
        validate_registration(&conn, "alice", "alice@x.com", "Password123").expect("valid");
    }

    #[test]
    fn test_collects_all_fields() {
        let conn = linkshare_db::open_memory().expect("db");
        let errors = errors_of(validate_registration(&conn, "al", "not-an-email", "short"));
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("username"), Some(USERNAME_TOO_SHORT));
        assert_eq!(errors.get("email"), Some(EMAIL_INVALID));
        assert_eq!(errors.get("password"), Some(PASSWORD_TOO_SHORT));
    }

    #[test]
    fn test_taken_overrides_format() {
        let conn = linkshare_db::open_memory().expect("db");
        seed(&conn, "alice", "alice@x.com");

        let errors = errors_of(validate_registration(&conn, "alice", "alice@x.com", "Password123"));
        assert_eq!(errors.get("username"), Some(USERNAME_TAKEN));
        assert_eq!(errors.get("email"), Some(EMAIL_TAKEN));
        assert_eq!(errors.get("password"), None);
    }

    #[test]
    fn test_duplicate_fails_even_when_other_fields_valid() {
        let conn = linkshare_db::open_memory().expect("db");
        seed(&conn, "alice", "alice@x.com");

        let errors = errors_of(validate_registration(&conn, "alice2", "alice@x.com", "Password123"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("email"), Some(EMAIL_TAKEN));
    }

    #[test]
    fn test_password_rules_in_order() {
        assert_eq!(validate_password_strength("Ab1"), Err(PASSWORD_TOO_SHORT));
        assert_eq!(validate_password_strength("password123"), Err(PASSWORD_NO_UPPER));
        assert_eq!(validate_password_strength("PASSWORD123"), Err(PASSWORD_NO_LOWER));
        assert_eq!(validate_password_strength("Passwordxyz"), Err(PASSWORD_NO_DIGIT));
        assert_eq!(validate_password_strength("Password123"), Ok(()));
    }

    #[test]
    fn test_email_format() {
        for ok in ["a@b.co", "first.last@mail-host.example.org", "x_y@d.c_1", "a@b.c.d"] {
            assert!(is_valid_email(ok), "{ok} should be valid");
        }
        for bad in ["", "plain", "@x.com", "a@", "a@b", "a@.com", "a@b.", "a@b.c-d", "a b@x.com", "a@b@c.com"] {
            assert!(!is_valid_email(bad), "{bad} should be invalid");
        }
    }

    #[test]
    fn test_display_lists_fields() {
        let mut errors = ValidationErrors::default();
        errors.insert("password", PASSWORD_NO_DIGIT);
        errors.insert("email", EMAIL_INVALID);
        assert_eq!(
            errors.to_string(),
            "email: Invalid email format; password: Password must contain at least one digit"
        );
    }
}
