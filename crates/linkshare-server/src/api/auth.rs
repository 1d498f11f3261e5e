//! Registration, login and password reset handlers.
//!
//! Argon2 runs through [`off_runtime`] between two short holds of the
//! database lock, never under it.

use std::sync::Arc;

use linkshare_accounts::{check_password, validation};
use linkshare_crypto::argon2id;
use linkshare_types::Account;
use serde_json::{json, Value};
use tracing::info;

use crate::api::{bearer, off_runtime, str_param, ApiError, ApiReply, ApiResult};
use crate::AppState;

pub const RESET_REQUESTED: &str =
    "If this email is registered, password reset instructions will be sent";

/// Public account fields returned to clients.
pub fn user_json(account: &Account) -> Value {
    json!({
        "id": account.id,
        "username": account.username,
        "email": account.email,
        "referral_code": account.referral_code,
    })
}

/// `POST /api/register`
pub async fn register(state: &Arc<AppState>, params: &Value) -> ApiResult {
    let username = str_param(params, "username");
    let email = str_param(params, "email");
    let password = str_param(params, "password");
    let referral_code = params.get("referral_code").and_then(|v| v.as_str());

    {
        let db = state.db.lock().await;
        validation::validate_registration(&db, username, email, password)?;
    }

    let cost = state.settings.password_cost;
    let plain = password.to_string();
    let password_hash = off_runtime(move || argon2id::hash_password(&plain, &cost)).await??;

    let account = {
        let db = state.db.lock().await;
        state
            .accounts(&db)
            .register_hashed(username, email, &password_hash, referral_code)?
    };
    let access_token = bearer::issue(state, account.id)?;

    Ok(ApiReply::created(json!({
        "message": "Registration successful",
        "access_token": access_token,
        "user": user_json(&account),
    })))
}

/// `POST /api/login`
pub async fn login(state: &Arc<AppState>, params: &Value) -> ApiResult {
    let username_or_email = str_param(params, "username_or_email");
    let password = str_param(params, "password");

    let candidate = {
        let db = state.db.lock().await;
        state.accounts(&db).find_login(username_or_email)?
    };

    let cost = state.settings.password_cost;
    let plain = password.to_string();
    let account = off_runtime(move || check_password(candidate, &plain, &cost)).await??;
    let account = account.ok_or_else(ApiError::invalid_credentials)?;
    let access_token = bearer::issue(state, account.id)?;
    info!(account_id = account.id, "Login");

    Ok(ApiReply::ok(json!({
        "message": "Login successful",
        "access_token": access_token,
        "user": user_json(&account),
    })))
}

/// `POST /api/forgot-password`
///
/// The reply is the same whether or not the email is registered.
pub async fn forgot_password(state: &Arc<AppState>, params: &Value) -> ApiResult {
    let email = str_param(params, "email");
    {
        let db = state.db.lock().await;
        state.accounts(&db).initiate_password_reset(email)?;
    }
    Ok(ApiReply::ok(json!({ "message": RESET_REQUESTED })))
}

/// `POST /api/reset-password`
pub async fn reset_password(state: &Arc<AppState>, params: &Value) -> ApiResult {
    let token = str_param(params, "token");
    let new_password = str_param(params, "new_password");

    validation::validate_password_strength(new_password).map_err(ApiError::bad_request)?;

    let live = {
        let db = state.db.lock().await;
        state.accounts(&db).find_live_reset(token)?.is_some()
    };
    if !live {
        return Err(invalid_token());
    }

    let cost = state.settings.password_cost;
    let plain = new_password.to_string();
    let password_hash = off_runtime(move || argon2id::hash_password(&plain, &cost)).await??;

    let reset = {
        let db = state.db.lock().await;
        state.accounts(&db).complete_reset(token, &password_hash)?
    };
    if !reset {
        return Err(invalid_token());
    }
    Ok(ApiReply::ok(json!({ "message": "Password reset successful" })))
}

fn invalid_token() -> ApiError {
    ApiError::bad_request("Invalid or expired token")
}

/// `GET /api/me`
pub async fn me(state: &Arc<AppState>, authorization: Option<&str>) -> ApiResult {
    let account_id = bearer::authorize(state, authorization)?;
    let account = {
        let db = state.db.lock().await;
        state.accounts(&db).get_account(account_id)?
    };
    let account = account.ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiReply::ok(json!({ "user": user_json(&account) })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::{INTERNAL_MESSAGE, INVALID_CREDENTIALS};
    use crate::api::test_support::{test_app, TestApp};
    use axum::http::StatusCode;
    use linkshare_accounts::Notification;

    async fn register_user(app: &TestApp, username: &str, referral_code: Option<&str>) -> Value {
        let reply = register(
            &app.state,
            &json!({
                "username": username,
                "email": format!("{username}@x.com"),
                "password": "Password123",
                "referral_code": referral_code,
            }),
        )
        .await
        .expect("register");
        assert_eq!(reply.status, StatusCode::CREATED);
        reply.body
    }

    fn bearer(body: &Value) -> String {
        format!("Bearer {}", body["access_token"].as_str().expect("token"))
    }

    #[tokio::test]
    async fn test_register_returns_token_and_user() {
        let app = test_app();
        let body = register_user(&app, "alice", None).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Registration successful");
        assert_eq!(body["user"]["username"], "alice");
        assert_eq!(body["user"]["email"], "alice@x.com");
        assert_eq!(body["user"]["referral_code"].as_str().map(str::len), Some(8));
        assert!(body["user"].get("password_hash").is_none());

        let me_reply = me(&app.state, Some(&bearer(&body))).await.expect("me");
        assert_eq!(me_reply.body["user"], body["user"]);
    }

    #[tokio::test]
    async fn test_register_validation_errors() {
        let app = test_app();
        let err = register(
            &app.state,
            &json!({ "username": "al", "email": "bad", "password": "weak" }),
        )
        .await
        .expect_err("invalid");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body["success"], false);
        assert_eq!(err.body["errors"]["username"], "Username must be at least 3 characters long");
        assert_eq!(err.body["errors"]["email"], "Invalid email format");
        assert_eq!(err.body["errors"]["password"], "Password must be at least 8 characters long");
    }

    #[tokio::test]
    async fn test_register_missing_fields() {
        let app = test_app();
        let err = register(&app.state, &json!({})).await.expect_err("invalid");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body["errors"].as_object().map(|m| m.len()), Some(3));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let app = test_app();
        register_user(&app, "alice", None).await;
        let err = register(
            &app.state,
            &json!({ "username": "alice2", "email": "alice@x.com", "password": "Password123" }),
        )
        .await
        .expect_err("duplicate");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body["errors"]["email"], "Email is already registered");
    }

    #[tokio::test]
    async fn test_register_invalid_referral_code() {
        let app = test_app();
        let err = register(
            &app.state,
            &json!({
                "username": "bob",
                "email": "bob@x.com",
                "password": "Password123",
                "referral_code": "nope1234",
            }),
        )
        .await
        .expect_err("invalid code");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message_text(), Some("Invalid referral code"));
    }

    #[tokio::test]
    async fn test_login() {
        let app = test_app();
        register_user(&app, "alice", None).await;

        for who in ["alice", "alice@x.com"] {
            let reply = login(&app.state, &json!({ "username_or_email": who, "password": "Password123" }))
                .await
                .expect("login");
            assert_eq!(reply.status, StatusCode::OK);
            assert_eq!(reply.body["message"], "Login successful");
            assert!(reply.body["access_token"].is_string());
        }
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let app = test_app();
        register_user(&app, "alice", None).await;

        let err = login(&app.state, &json!({ "username_or_email": "alice@x.com", "password": "WrongPass" }))
            .await
            .expect_err("rejected");
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.body, json!({ "success": false, "message": INVALID_CREDENTIALS }));

        let unknown = login(&app.state, &json!({ "username_or_email": "ghost", "password": "Password123" }))
            .await
            .expect_err("rejected");
        assert_eq!(unknown.body, err.body);
    }

    #[tokio::test]
    async fn test_forgot_password_does_not_reveal_existence() {
        let app = test_app();
        register_user(&app, "alice", None).await;

        let known = forgot_password(&app.state, &json!({ "email": "alice@x.com" }))
            .await
            .expect("known");
        let unknown = forgot_password(&app.state, &json!({ "email": "ghost@x.com" }))
            .await
            .expect("unknown");
        assert_eq!(known.status, StatusCode::OK);
        assert_eq!(known.body, unknown.body);
        assert_eq!(app.outbox.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_password_flow() {
        let app = test_app();
        register_user(&app, "alice", None).await;
        forgot_password(&app.state, &json!({ "email": "alice@x.com" }))
            .await
            .expect("forgot");
        let token = match app.outbox.drain().pop().map(|m| m.notification) {
            Some(Notification::PasswordReset { token, reset_url }) => {
                assert!(reset_url.starts_with("http://frontend.test/reset-password?token="));
                token
            }
            other => panic!("expected reset notification, got {other:?}"),
        };

        let weak = reset_password(&app.state, &json!({ "token": token, "new_password": "weakpass" }))
            .await
            .expect_err("weak");
        assert_eq!(weak.message_text(), Some("Password must contain at least one uppercase letter"));

        let reply = reset_password(&app.state, &json!({ "token": token, "new_password": "NewPassword1" }))
            .await
            .expect("reset");
        assert_eq!(reply.body["message"], "Password reset successful");

        let reused = reset_password(&app.state, &json!({ "token": token, "new_password": "NewPassword2" }))
            .await
            .expect_err("single use");
        assert_eq!(reused.status, StatusCode::BAD_REQUEST);
        assert_eq!(reused.message_text(), Some("Invalid or expired token"));

        login(&app.state, &json!({ "username_or_email": "alice", "password": "NewPassword1" }))
            .await
            .expect("new password works");
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let app = test_app();
        let err = me(&app.state, None).await.expect_err("no token");
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);

        let err = me(&app.state, Some("Bearer garbage")).await.expect_err("bad token");
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_ne!(err.message_text(), Some(INTERNAL_MESSAGE));
    }

    #[tokio::test]
    async fn test_me_unknown_account() {
        let app = test_app();
        let token = bearer::issue(&app.state, 999).expect("issue");
        let err = me(&app.state, Some(&format!("Bearer {token}")))
            .await
            .expect_err("missing account");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message_text(), Some("User not found"));
    }
}
