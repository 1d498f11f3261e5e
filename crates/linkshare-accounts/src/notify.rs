//! Outbound notifications.
//!
//! The account service hands each message to a [`Notifier`] as a recipient,
//! a subject, a template key and template parameters. Rendering and mail
//! delivery happen behind the trait.

use std::sync::Mutex;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

/// Delivery failures reported by a [`Notifier`].
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// A templated message the service can send.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "template", rename_all = "snake_case")]
pub enum Notification {
    PasswordReset { reset_url: String, token: String },
    Welcome { username: String },
    ReferralSuccess { referred_username: String },
}

impl Notification {
    pub fn template_key(&self) -> &'static str {
        match self {
            Notification::PasswordReset { .. } => "password_reset",
            Notification::Welcome { .. } => "welcome",
            Notification::ReferralSuccess { .. } => "referral_success",
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            Notification::PasswordReset { .. } => "Password Reset",
            Notification::Welcome { .. } => "Welcome to LinkShare!",
            Notification::ReferralSuccess { .. } => "Someone joined using your referral!",
        }
    }

    /// Template parameters as a JSON object.
    pub fn params(&self) -> Value {
        match self {
            Notification::PasswordReset { reset_url, token } => {
                json!({ "reset_url": reset_url, "token": token })
            }
            Notification::Welcome { username } => json!({ "username": username }),
            Notification::ReferralSuccess { referred_username } => {
                json!({ "referred_username": referred_username })
            }
        }
    }
}

/// Sends a notification to one recipient.
pub trait Notifier: Send + Sync {
    fn send(&self, to: &str, subject: &str, notification: &Notification) -> Result<(), NotifyError>;
}

/// Emits each notification as a `tracing` event. Parameters are not logged
/// since they can carry reset tokens.
#[derive(Clone, Debug)]
pub struct LogNotifier {
    sender: String,
}

impl LogNotifier {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }
}

impl Notifier for LogNotifier {
    fn send(&self, to: &str, subject: &str, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            from = %self.sender,
            to,
            subject,
            template = notification.template_key(),
            "Notification dispatched"
        );
        Ok(())
    }
}

/// A notification captured by [`OutboxNotifier`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: String,
    pub subject: String,
    pub notification: Notification,
}

/// Keeps every notification in memory until drained.
#[derive(Debug, Default)]
pub struct OutboxNotifier {
    messages: Mutex<Vec<OutboundMessage>>,
}

impl OutboxNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything sent so far.
    pub fn drain(&self) -> Vec<OutboundMessage> {
        let mut messages = self.messages.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *messages)
    }

    pub fn len(&self) -> usize {
        self.messages.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for OutboxNotifier {
    fn send(&self, to: &str, subject: &str, notification: &Notification) -> Result<(), NotifyError> {
        let mut messages = self.messages.lock().unwrap_or_else(|e| e.into_inner());
        messages.push(OutboundMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            notification: notification.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_keys_and_params() {
        let n = Notification::PasswordReset {
            reset_url: "http://app/reset-password?token=abc".into(),
            token: "abc".into(),
        };
        assert_eq!(n.template_key(), "password_reset");
        assert_eq!(n.subject(), "Password Reset");
        assert_eq!(n.params()["token"], "abc");
        assert_eq!(n.params()["reset_url"], "http://app/reset-password?token=abc");

        let w = Notification::Welcome {
            username: "alice".into(),
        };
        assert_eq!(w.template_key(), "welcome");
        assert_eq!(w.params(), json!({ "username": "alice" }));
    }

    #[test]
    fn test_outbox_drain() {
        let outbox = OutboxNotifier::new();
        let n = Notification::ReferralSuccess {
            referred_username: "bob".into(),
        };
        outbox.send("alice@x.com", n.subject(), &n).expect("send");
        assert_eq!(outbox.len(), 1);

        let drained = outbox.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].to, "alice@x.com");
        assert_eq!(drained[0].notification, n);
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_outbox_survives_poisoned_lock() {
        let outbox = OutboxNotifier::new();
        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = outbox.messages.lock();
            panic!("poison the outbox");
        }));
        assert!(poisoned.is_err());
        assert!(outbox.messages.is_poisoned());

        let n = Notification::Welcome {
            username: "alice".into(),
        };
        outbox.send("alice@x.com", n.subject(), &n).expect("send");
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox.drain()[0].notification, n);
    }

    #[test]
    fn test_log_notifier_accepts() {
        let notifier = LogNotifier::new("noreply@linkshare.test");
        let n = Notification::Welcome {
            username: "alice".into(),
        };
        notifier.send("alice@x.com", n.subject(), &n).expect("send");
    }
}
