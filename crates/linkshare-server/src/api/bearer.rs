//! Bearer token authentication.

use linkshare_types::AccountId;
use tracing::debug;

use crate::api::ApiError;
use crate::AppState;

/// Resolve an `Authorization: Bearer <token>` header to the account id it
/// was issued for.
pub fn authorize(state: &AppState, header: Option<&str>) -> Result<AccountId, ApiError> {
    let token = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(ApiError::unauthorized)?;

    match state.signer.verify(token, state.clock.now()) {
        Ok(claims) => Ok(claims.sub),
        Err(e) => {
            debug!("Bearer token rejected: {e}");
            Err(ApiError::unauthorized())
        }
    }
}

/// Issue a bearer token for `account_id`.
pub fn issue(state: &AppState, account_id: AccountId) -> Result<String, ApiError> {
    Ok(state.signer.issue(account_id, state.clock.now())?)
}
