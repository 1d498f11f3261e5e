//! Integration test: registration, login and referral through the API.
//!
//! 1. Register alice without a code
//! 2. Register bob with alice's code
//! 3. Verify alice's referral statistics and listing
//! 4. Verify login failures leak nothing
//! 5. Verify duplicate and self-referral handling

use axum::http::StatusCode;
use linkshare_accounts::AccountError;
use linkshare_integration_tests::{bearer_header, Harness};
use linkshare_server::api::{auth, referrals};
use serde_json::{json, Value};

async fn register(h: &Harness, username: &str, email: &str, code: Option<&str>) -> Value {
    let reply = auth::register(
        &h.state,
        &json!({
            "username": username,
            "email": email,
            "password": "Password123",
            "referral_code": code,
        }),
    )
    .await
    .expect("registration should succeed");
    assert_eq!(reply.status, StatusCode::CREATED);
    reply.body
}

#[tokio::test]
async fn referred_registration_rewards_referrer() {
    let h = Harness::new();

    // Step 1: alice
    let alice = register(&h, "alice", "alice@x.com", None).await;
    assert!(alice["access_token"].is_string());
    let code = alice["user"]["referral_code"]
        .as_str()
        .expect("referral code")
        .to_string();

    // Step 2: bob, referred by alice
    let bob = register(&h, "bob", "bob@x.com", Some(&code)).await;
    assert_ne!(bob["user"]["referral_code"], alice["user"]["referral_code"]);

    // Step 3: alice's stats and listing
    let stats = referrals::stats(&h.state, Some(&bearer_header(&alice)))
        .await
        .expect("stats");
    assert_eq!(
        stats.body["stats"],
        json!({ "total_referrals": 1, "successful_referrals": 1, "rewards_earned": 1 })
    );

    let list = referrals::list(&h.state, Some(&bearer_header(&alice)))
        .await
        .expect("list");
    let entries = list.body["referrals"].as_array().expect("referrals array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["referred_user"]["id"], bob["user"]["id"]);
    assert_eq!(entries[0]["referred_user"]["username"], "bob");
    assert_eq!(entries[0]["status"], "successful");
}

#[tokio::test]
async fn wrong_password_login_is_opaque() {
    let h = Harness::new();
    register(&h, "alice", "alice@x.com", None).await;

    let err = auth::login(
        &h.state,
        &json!({ "username_or_email": "alice", "password": "WrongPass" }),
    )
    .await
    .expect_err("login must fail");
    assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    assert_eq!(err.body, json!({ "success": false, "message": "Invalid credentials" }));
}

#[tokio::test]
async fn duplicates_fail_validation() {
    let h = Harness::new();
    register(&h, "alice", "alice@x.com", None).await;

    for (username, email, field) in [
        ("alice", "new@x.com", "username"),
        ("newbie", "alice@x.com", "email"),
    ] {
        let err = auth::register(
            &h.state,
            &json!({ "username": username, "email": email, "password": "Password123" }),
        )
        .await
        .expect_err("duplicate must fail");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.body["errors"][field].is_string(), "missing error for {field}");
    }
}

#[tokio::test]
async fn service_level_referral_errors() {
    let h = Harness::new();
    let alice = register(&h, "alice", "alice@x.com", None).await;
    let code = alice["user"]["referral_code"].as_str().expect("code");

    let db = h.state.db.lock().await;
    let accounts = h.state.accounts(&db);

    let self_referral = accounts.register("alice2", "alice@x.com", "Password123", Some(code));
    assert!(matches!(self_referral, Err(AccountError::SelfReferral)));

    let bad_code = accounts.register("carol", "carol@x.com", "Password123", Some("00000000"));
    assert!(matches!(bad_code, Err(AccountError::InvalidReferralCode)));

    assert!(accounts.authenticate("carol", "Password123").expect("auth").is_none());
}

#[tokio::test]
async fn taken_email_reported_before_referral_checks() {
    let h = Harness::new();
    let alice = register(&h, "alice", "alice@x.com", None).await;

    // Email taken wins at the validation stage.
    let err = auth::register(
        &h.state,
        &json!({
            "username": "alice2",
            "email": "alice@x.com",
            "password": "Password123",
            "referral_code": alice["user"]["referral_code"],
        }),
    )
    .await
    .expect_err("must fail");
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.body["errors"]["email"], "Email is already registered");
}

#[tokio::test]
async fn signup_notifications_when_enabled() {
    let h = Harness::with_config(|c| c.mail.signup_notifications = true);
    let alice = register(&h, "alice", "alice@x.com", None).await;
    let code = alice["user"]["referral_code"].as_str().expect("code").to_string();
    register(&h, "bob", "bob@x.com", Some(&code)).await;

    let sent = h.outbox.drain();
    let templates: Vec<(&str, &str)> = sent
        .iter()
        .map(|m| (m.to.as_str(), m.notification.template_key()))
        .collect();
    assert_eq!(
        templates,
        vec![
            ("alice@x.com", "welcome"),
            ("bob@x.com", "welcome"),
            ("alice@x.com", "referral_success"),
        ]
    );
}
