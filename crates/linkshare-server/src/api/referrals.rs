//! Referral listing and statistics handlers.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat};
use linkshare_types::ReferralDetail;
use serde_json::{json, Value};

use crate::api::{bearer, ApiReply, ApiResult};
use crate::AppState;

/// RFC 3339 UTC rendering of a Unix timestamp.
pub fn rfc3339(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn referral_json(detail: &ReferralDetail) -> Value {
    json!({
        "id": detail.edge.id,
        "referred_user": {
            "id": detail.referred_user.id,
            "username": detail.referred_user.username,
        },
        "date_referred": rfc3339(detail.edge.created_at),
        "status": detail.edge.status,
    })
}

/// `GET /api/referrals`
pub async fn list(state: &Arc<AppState>, authorization: Option<&str>) -> ApiResult {
    let account_id = bearer::authorize(state, authorization)?;
    let details = {
        let db = state.db.lock().await;
        state.referrals(&db).list_referral_details(account_id)?
    };
    let referrals: Vec<Value> = details.iter().map(referral_json).collect();
    Ok(ApiReply::ok(json!({ "referrals": referrals })))
}

/// `GET /api/referral-stats`
pub async fn stats(state: &Arc<AppState>, authorization: Option<&str>) -> ApiResult {
    let account_id = bearer::authorize(state, authorization)?;
    let stats = {
        let db = state.db.lock().await;
        state.referrals(&db).stats_for(account_id)?
    };
    Ok(ApiReply::ok(json!({ "stats": stats })))
}
