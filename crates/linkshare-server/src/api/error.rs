//! API replies and errors.
//!
//! Every body carries `success`. Failures carry either a single `message`
//! or a field-level `errors` map. Internal failures are logged and reported
//! with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use linkshare_accounts::{AccountError, ValidationErrors};
use serde_json::{json, Value};
use tracing::error;

pub const INTERNAL_MESSAGE: &str = "Something went wrong";
pub const UNAUTHORIZED_MESSAGE: &str = "Missing or invalid token";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// A successful reply.
#[derive(Debug, Clone)]
pub struct ApiReply {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiReply {
    /// 200 with `success: true` merged into `body`.
    pub fn ok(body: Value) -> Self {
        Self::with_status(StatusCode::OK, body)
    }

    /// 201 with `success: true` merged into `body`.
    pub fn created(body: Value) -> Self {
        Self::with_status(StatusCode::CREATED, body)
    }

    fn with_status(status: StatusCode, mut body: Value) -> Self {
        if let Some(map) = body.as_object_mut() {
            map.insert("success".to_string(), Value::Bool(true));
        }
        Self { status, body }
    }
}

/// A failed reply.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiError {
    fn message(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: json!({ "success": false, "message": message }),
        }
    }

    /// 400 with field-level errors.
    pub fn validation(errors: &ValidationErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: json!({ "success": false, "errors": errors }),
        }
    }

    /// 400 with a single message.
    pub fn bad_request(message: &str) -> Self {
        Self::message(StatusCode::BAD_REQUEST, message)
    }

    /// 401 for a missing, malformed, forged or expired bearer token.
    pub fn unauthorized() -> Self {
        Self::message(StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE)
    }

    /// 401 for a failed login.
    pub fn invalid_credentials() -> Self {
        Self::message(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS)
    }

    pub fn not_found(message: &str) -> Self {
        Self::message(StatusCode::NOT_FOUND, message)
    }

    /// 500. `detail` goes to the log only.
    pub fn internal(detail: &dyn std::fmt::Display) -> Self {
        error!("Request failed: {detail}");
        Self::message(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
    }

    /// The `message` field, if the body has one.
    pub fn message_text(&self) -> Option<&str> {
        self.body.get("message").and_then(|v| v.as_str())
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        if !err.is_client_error() {
            return ApiError::internal(&err);
        }
        match err.field_errors() {
            Some(errors) => ApiError::validation(&errors),
            None => ApiError::bad_request(&err.to_string()),
        }
    }
}

impl From<linkshare_referrals::ReferralError> for ApiError {
    fn from(err: linkshare_referrals::ReferralError) -> Self {
        ApiError::internal(&err)
    }
}

impl From<linkshare_crypto::CryptoError> for ApiError {
    fn from(err: linkshare_crypto::CryptoError) -> Self {
        ApiError::internal(&err)
    }
}

impl IntoResponse for ApiReply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
