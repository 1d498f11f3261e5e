//! HTTP routes under `/api`.
//!
//! Each route is a thin axum adapter around a plain async handler taking the
//! shared state and the parsed JSON body (or the bearer header), so handlers
//! run in tests without a socket.

pub mod auth;
pub mod bearer;
pub mod error;
pub mod referrals;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::Value;

pub use error::{ApiError, ApiReply};

use crate::AppState;

pub type ApiResult = std::result::Result<ApiReply, ApiError>;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/me", get(me))
        .route("/referrals", get(list_referrals))
        .route("/referral-stats", get(referral_stats));

    Router::new().nest("/api", api).with_state(state)
}

/// Parse a request body as a JSON object.
pub fn parse_body(body: &[u8]) -> std::result::Result<Value, ApiError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) if value.is_object() => Ok(value),
        _ => Err(ApiError::bad_request("Request body must be a JSON object")),
    }
}

/// String field from a request body; absent or non-string is empty.
pub(crate) fn str_param<'a>(params: &'a Value, key: &str) -> &'a str {
    params.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

/// Run CPU-bound work such as Argon2 on the blocking pool.
///
/// Callers must not hold the database lock across this.
pub(crate) async fn off_runtime<T, F>(work: F) -> std::result::Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(&e))
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

async fn with_body<F, Fut>(state: Arc<AppState>, body: Bytes, handler: F) -> Response
where
    F: FnOnce(Arc<AppState>, Value) -> Fut,
    Fut: std::future::Future<Output = ApiResult>,
{
    match parse_body(&body) {
        Ok(params) => handler(state, params).await.into_response(),
        Err(e) => e.into_response(),
    }
}

async fn register(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    with_body(state, body, |s, p| async move { auth::register(&s, &p).await }).await
}

async fn login(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    with_body(state, body, |s, p| async move { auth::login(&s, &p).await }).await
}

async fn forgot_password(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    with_body(state, body, |s, p| async move { auth::forgot_password(&s, &p).await }).await
}

async fn reset_password(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    with_body(state, body, |s, p| async move { auth::reset_password(&s, &p).await }).await
}

async fn me(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    auth::me(&state, authorization(&headers)).await.into_response()
}

async fn list_referrals(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    referrals::list(&state, authorization(&headers)).await.into_response()
}

async fn referral_stats(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    referrals::stats(&state, authorization(&headers)).await.into_response()
}
