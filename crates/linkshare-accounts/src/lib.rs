//! # linkshare-accounts
//!
//! Account lifecycle for the LinkShare service.
//!
//! - [`service`] - registration, authentication and password reset
//! - [`validation`] - registration and password-strength rules
//! - [`notify`] - the outbound notification seam
//!
//! Registration writes the account, its referral edge and the referrer's
//! reward inside one savepoint. Notifications are sent only after commit.
//!
//! Password hashing never needs the connection. The `*_hashed`,
//! `find_*` and `complete_reset` entry points let a caller that shares one
//! connection run Argon2 without holding it.

pub mod error;
pub mod notify;
pub mod service;
pub mod validation;

pub use error::{AccountError, Result};
pub use notify::{LogNotifier, Notification, Notifier, NotifyError, OutboxNotifier};
pub use service::{check_password, AccountService, AccountSettings};
pub use validation::ValidationErrors;
