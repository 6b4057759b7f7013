//! Signal webhook handler
//!
//! Unlike WhatsApp, Signal verification is mandatory: a missing secret is a
//! configuration error caught at startup, so every request here is checked.

use application::request_context::RequestContext;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use integration_signal::{SIGNATURE_HEADER, SignalWebhookPayload, verify_signature};
use secrecy::ExposeSecret;
use tracing::{info, instrument, warn};

use crate::error::ApiError;
use crate::handlers::check_clock_skew;
use crate::state::AppState;

/// Signal webhook message handler (POST /webhook/signal)
#[instrument(skip(state, headers, body))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let config = state.config.load();

    if let Err(e) = check_clock_skew(&headers, config.server.webhook_max_skew_sec) {
        warn!("signal webhook rejected: {e}");
        return e.into_response();
    }

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !verify_signature(&body, signature, config.signal.webhook_secret.expose_secret()) {
        warn!("signal webhook signature verification failed");
        return ApiError::Unauthorized("invalid signature".to_string()).into_response();
    }

    let payload: SignalWebhookPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!("signal webhook payload decode failed: {e}");
            return ApiError::BadRequest(format!("invalid payload: {e}")).into_response();
        },
    };

    let event = match payload.into_event() {
        Ok(e) => e,
        Err(e) => {
            warn!("signal webhook event translation failed: {e}");
            return ApiError::BadRequest(e.to_string()).into_response();
        },
    };

    let ctx = RequestContext::new();
    match state.message_service.handle(event, &ctx).await {
        Ok(()) => {
            info!(request_id = %ctx.request_id(), "signal webhook relayed");
            StatusCode::OK.into_response()
        },
        Err(e) => {
            state.metrics.record_error(&e);
            warn!(request_id = %ctx.request_id(), error = %e, "signal webhook relay failed");
            let api_err: ApiError = e.into();
            api_err.into_response()
        },
    }
}
