//! Metrics and observability handlers
//!
//! Exposes relay throughput and error counters in a structured format
//! suitable for monitoring systems.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Metrics response containing all application metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub app: AppMetrics,
    pub requests: RequestMetrics,
    pub relay: RelayMetrics,
}

/// Application metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppMetrics {
    pub version: String,
    pub name: String,
    pub uptime_seconds: u64,
}

/// Request statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMetrics {
    pub total_requests: u64,
    pub success_count: u64,
    pub client_error_count: u64,
    pub server_error_count: u64,
    pub avg_response_time_ms: f64,
    pub active_requests: u64,
}

/// Relay throughput and error counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayMetrics {
    pub relayed_to_signal: u64,
    pub relayed_to_whatsapp: u64,
    pub reactions_relayed: u64,
    pub edits_relayed: u64,
    pub deletions_relayed: u64,
    pub acks_processed: u64,
    pub errors_transport: u64,
    pub errors_protocol: u64,
    pub errors_no_route: u64,
    pub errors_rate_limited: u64,
    pub errors_other: u64,
}

/// Atomic counters for request and relay metrics
#[derive(Debug)]
pub struct MetricsCollector {
    start_time: Instant,
    total_requests: AtomicU64,
    success_count: AtomicU64,
    client_error_count: AtomicU64,
    server_error_count: AtomicU64,
    active_requests: AtomicU64,
    total_response_time_us: AtomicU64,
    relayed_to_signal: AtomicU64,
    relayed_to_whatsapp: AtomicU64,
    reactions_relayed: AtomicU64,
    edits_relayed: AtomicU64,
    deletions_relayed: AtomicU64,
    acks_processed: AtomicU64,
    errors_transport: AtomicU64,
    errors_protocol: AtomicU64,
    errors_no_route: AtomicU64,
    errors_rate_limited: AtomicU64,
    errors_other: AtomicU64,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            total_requests: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            client_error_count: AtomicU64::new(0),
            server_error_count: AtomicU64::new(0),
            active_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            relayed_to_signal: AtomicU64::new(0),
            relayed_to_whatsapp: AtomicU64::new(0),
            reactions_relayed: AtomicU64::new(0),
            edits_relayed: AtomicU64::new(0),
            deletions_relayed: AtomicU64::new(0),
            acks_processed: AtomicU64::new(0),
            errors_transport: AtomicU64::new(0),
            errors_protocol: AtomicU64::new(0),
            errors_no_route: AtomicU64::new(0),
            errors_rate_limited: AtomicU64::new(0),
            errors_other: AtomicU64::new(0),
        }
    }

    /// Record start of a request
    pub fn request_start(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.active_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record end of a request
    pub fn request_end(&self, response_time_us: u64, status_code: u16) {
        self.active_requests.fetch_sub(1, Ordering::Relaxed);
        self.total_response_time_us
            .fetch_add(response_time_us, Ordering::Relaxed);

        match status_code {
            200..=299 => {
                self.success_count.fetch_add(1, Ordering::Relaxed);
            },
            400..=499 => {
                self.client_error_count.fetch_add(1, Ordering::Relaxed);
            },
            500..=599 => {
                self.server_error_count.fetch_add(1, Ordering::Relaxed);
            },
            _ => {},
        }
    }

    /// Record that an event of `kind` was relayed toward `destination`.
    pub fn record_relay(&self, destination: RelayDestination, kind: RelayKind) {
        match kind {
            RelayKind::TextOrMedia => match destination {
                RelayDestination::Signal => self.relayed_to_signal.fetch_add(1, Ordering::Relaxed),
                RelayDestination::WhatsApp => self.relayed_to_whatsapp.fetch_add(1, Ordering::Relaxed),
            },
            RelayKind::Reaction => self.reactions_relayed.fetch_add(1, Ordering::Relaxed),
            RelayKind::Edit => self.edits_relayed.fetch_add(1, Ordering::Relaxed),
            RelayKind::Deletion => self.deletions_relayed.fetch_add(1, Ordering::Relaxed),
            RelayKind::Ack => self.acks_processed.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Record a relay failure, bucketed by error kind.
    pub fn record_error(&self, error: &application::WhatSignalError) {
        use application::WhatSignalError as E;
        match error {
            E::Transport(_) => self.errors_transport.fetch_add(1, Ordering::Relaxed),
            E::Protocol(_) => self.errors_protocol.fetch_add(1, Ordering::Relaxed),
            E::NoRoute(_) | E::ChannelNotFound(_) | E::MappingNotFound(_) | E::ChatKindMismatch(_) => {
                self.errors_no_route.fetch_add(1, Ordering::Relaxed)
            },
            E::RateLimited => self.errors_rate_limited.fetch_add(1, Ordering::Relaxed),
            _ => self.errors_other.fetch_add(1, Ordering::Relaxed),
        };
    }

    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    #[must_use]
    pub fn request_metrics(&self) -> RequestMetrics {
        let total = self.total_requests.load(Ordering::Relaxed);
        let total_time = self.total_response_time_us.load(Ordering::Relaxed);

        RequestMetrics {
            total_requests: total,
            success_count: self.success_count.load(Ordering::Relaxed),
            client_error_count: self.client_error_count.load(Ordering::Relaxed),
            server_error_count: self.server_error_count.load(Ordering::Relaxed),
            #[allow(clippy::cast_precision_loss)]
            avg_response_time_ms: if total > 0 {
                (total_time as f64) / (total as f64) / 1000.0
            } else {
                0.0
            },
            active_requests: self.active_requests.load(Ordering::Relaxed),
        }
    }

    #[must_use]
    pub fn relay_metrics(&self) -> RelayMetrics {
        RelayMetrics {
            relayed_to_signal: self.relayed_to_signal.load(Ordering::Relaxed),
            relayed_to_whatsapp: self.relayed_to_whatsapp.load(Ordering::Relaxed),
            reactions_relayed: self.reactions_relayed.load(Ordering::Relaxed),
            edits_relayed: self.edits_relayed.load(Ordering::Relaxed),
            deletions_relayed: self.deletions_relayed.load(Ordering::Relaxed),
            acks_processed: self.acks_processed.load(Ordering::Relaxed),
            errors_transport: self.errors_transport.load(Ordering::Relaxed),
            errors_protocol: self.errors_protocol.load(Ordering::Relaxed),
            errors_no_route: self.errors_no_route.load(Ordering::Relaxed),
            errors_rate_limited: self.errors_rate_limited.load(Ordering::Relaxed),
            errors_other: self.errors_other.load(Ordering::Relaxed),
        }
    }
}

/// Which side of the bridge a relayed event moved toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayDestination {
    Signal,
    WhatsApp,
}

/// The shape of event a relay counter increments for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayKind {
    TextOrMedia,
    Reaction,
    Edit,
    Deletion,
    Ack,
}

/// Get metrics endpoint
pub async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    let metrics = state.metrics.as_ref();

    Json(MetricsResponse {
        app: AppMetrics {
            version: env!("CARGO_PKG_VERSION").to_string(),
            name: env!("CARGO_PKG_NAME").to_string(),
            uptime_seconds: metrics.uptime_seconds(),
        },
        requests: metrics.request_metrics(),
        relay: metrics.relay_metrics(),
    })
}
