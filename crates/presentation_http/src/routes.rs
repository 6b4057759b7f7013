//! Route definitions

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::{handlers, middleware::RateLimiterLayer, state::AppState};

/// Create the main router with all routes.
///
/// Layers are applied innermost-to-outermost as listed, so execution runs in
/// the opposite order: body-size limiting runs first (413), then rate
/// limiting (429), then the tracing span opens over whatever reaches the
/// handler, matching the webhook pipeline order. Request-id and
/// security-header layers are applied by the caller, outside this router, so
/// they wrap both gates and the tracing span.
pub fn create_router(state: AppState, max_body_bytes: usize, rate_limiter: RateLimiterLayer) -> Router {
    Router::new()
        .route("/webhook/whatsapp", post(handlers::whatsapp::handle_webhook))
        .route("/webhook/signal", post(handlers::signal::handle_webhook))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::metrics::get_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(rate_limiter)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}
