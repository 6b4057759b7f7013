//! HTTP request handlers

pub mod health;
pub mod metrics;
pub mod signal;
pub mod whatsapp;

use axum::http::HeaderMap;
use chrono::Utc;

use crate::error::ApiError;

/// Header carrying the sender's send-time, checked against `webhook_max_skew_sec`.
pub const TIMESTAMP_HEADER: &str = "x-webhook-timestamp";

/// Reject a webhook whose declared send time is missing, malformed, or too
/// far from wall-clock `now` in either direction.
pub fn check_clock_skew(headers: &HeaderMap, max_skew_sec: i64) -> Result<(), ApiError> {
    let raw = headers
        .get(TIMESTAMP_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing X-Webhook-Timestamp".to_string()))?;

    let sent_at: i64 = raw
        .parse()
        .map_err(|_| ApiError::Unauthorized("malformed X-Webhook-Timestamp".to_string()))?;

    let skew = (Utc::now().timestamp() - sent_at).abs();
    if skew > max_skew_sec {
        return Err(ApiError::Unauthorized(format!("clock skew {skew}s exceeds max {max_skew_sec}s")));
    }

    Ok(())
}
