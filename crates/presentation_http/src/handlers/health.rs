//! Health check handlers

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Liveness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Liveness check - is the process running at all?
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub mapping_store: ServiceStatus,
    pub whatsapp: ServiceStatus,
    pub signal: ServiceStatus,
}

/// Status of a single downstream dependency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceStatus {
    fn ok() -> Self {
        Self { healthy: true, error: None }
    }

    fn err(e: impl ToString) -> Self {
        Self { healthy: false, error: Some(e.to_string()) }
    }
}

/// Readiness check - can we actually relay messages right now?
///
/// Checks the mapping store and both transport clients in parallel; any
/// failure drops the whole response to 503 so load balancers stop sending
/// traffic without restarting the process.
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let (store_result, whatsapp_result, signal_result) = tokio::join!(
        state.mapping_store.health_check(),
        state.whatsapp_transport.health_check(),
        state.signal_transport.health_check(),
    );

    let mapping_store = store_result.map_or_else(ServiceStatus::err, |()| ServiceStatus::ok());
    let whatsapp = whatsapp_result.map_or_else(ServiceStatus::err, |()| ServiceStatus::ok());
    let signal = signal_result.map_or_else(ServiceStatus::err, |()| ServiceStatus::ok());

    let ready = mapping_store.healthy && whatsapp.healthy && signal.healthy;
    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status_code,
        Json(ReadinessResponse { ready, mapping_store, whatsapp, signal }),
    )
}
