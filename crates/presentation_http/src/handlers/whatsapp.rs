//! WhatsApp webhook handler
//!
//! Verification is optional: when `whatsapp.webhook_secret` is unset the
//! HMAC check is skipped entirely (a development convenience), otherwise a
//! missing or mismatched signature is rejected before the body is parsed.

use application::request_context::RequestContext;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use integration_whatsapp::{SIGNATURE_HEADER, WebhookPayload, verify_signature};
use secrecy::ExposeSecret;
use tracing::{info, instrument, warn};

use crate::error::ApiError;
use crate::handlers::check_clock_skew;
use crate::state::AppState;

/// WhatsApp webhook message handler (POST /webhook/whatsapp)
#[instrument(skip(state, headers, body))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let config = state.config.load();

    if let Some(secret) = &config.whatsapp.webhook_secret {
        if let Err(e) = check_clock_skew(&headers, config.server.webhook_max_skew_sec) {
            warn!("whatsapp webhook rejected: {e}");
            return e.into_response();
        }

        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !verify_signature(&body, signature, secret.expose_secret()) {
            warn!("whatsapp webhook signature verification failed");
            return ApiError::Unauthorized("invalid signature".to_string()).into_response();
        }
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!("whatsapp webhook payload decode failed: {e}");
            return ApiError::BadRequest(format!("invalid payload: {e}")).into_response();
        },
    };

    let event = match payload.into_event() {
        Ok(e) => e,
        Err(e) => {
            warn!("whatsapp webhook event translation failed: {e}");
            return ApiError::BadRequest(e.to_string()).into_response();
        },
    };

    let ctx = RequestContext::new();
    match state.message_service.handle(event, &ctx).await {
        Ok(()) => {
            info!(request_id = %ctx.request_id(), "whatsapp webhook relayed");
            StatusCode::OK.into_response()
        },
        Err(e) => {
            state.metrics.record_error(&e);
            warn!(request_id = %ctx.request_id(), error = %e, "whatsapp webhook relay failed");
            let api_err: ApiError = e.into();
            api_err.into_response()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_skew_check_lives_in_parent_module() {
        let headers = HeaderMap::new();
        assert!(check_clock_skew(&headers, 300).is_err());
    }
}
