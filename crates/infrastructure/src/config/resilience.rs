//! Resilience configuration: retry and telemetry.

use serde::{Deserialize, Serialize};

// ==============================
// Telemetry Configuration
// ==============================

/// Telemetry configuration for OpenTelemetry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryAppConfig {
    /// Enable telemetry
    #[serde(default)]
    pub enabled: bool,

    /// OTLP endpoint URL. Presence plus `enabled` gates OTLP export; absent
    /// falls back to local stdout/JSON logging via `tracing-subscriber`.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,

    /// Sample ratio (0.0 to 1.0)
    #[serde(default)]
    pub sample_ratio: Option<f64>,
}

impl Default for TelemetryAppConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            otlp_endpoint: None,
            sample_ratio: Some(1.0),
        }
    }
}

impl TelemetryAppConfig {
    /// Convert to `crate::telemetry::TelemetryConfig`, the shape
    /// `init_telemetry` expects. OTLP export is gated on `enabled` AND the
    /// endpoint being configured.
    #[must_use]
    pub fn to_telemetry_config(&self) -> crate::telemetry::TelemetryConfig {
        let mut telemetry = crate::telemetry::TelemetryConfig {
            enabled: self.enabled && self.otlp_endpoint.is_some(),
            ..Default::default()
        };
        if let Some(endpoint) = &self.otlp_endpoint {
            telemetry.endpoint.clone_from(endpoint);
        }
        if let Some(ratio) = self.sample_ratio {
            telemetry.sampling_ratio = ratio;
        }
        telemetry
    }
}

// ==============================
// Retry Configuration
// ==============================

/// Retry configuration for outbound transport calls, consumed by the Bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryAppConfig {
    /// Initial backoff before the first retry, in milliseconds.
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff between retries, in milliseconds.
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,

    /// Multiplier for exponential backoff.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Maximum number of attempts (including the first), per spec's
    /// `retry.max_attempts` config key.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

const fn default_initial_backoff() -> u64 {
    100
}

const fn default_max_backoff() -> u64 {
    10_000
}

const fn default_multiplier() -> f64 {
    2.0
}

const fn default_max_attempts() -> u32 {
    3
}

impl Default for RetryAppConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
            multiplier: default_multiplier(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl RetryAppConfig {
    /// Convert to `application::retry::RetryConfig` for use by the Bridge.
    #[must_use]
    pub const fn to_retry_config(&self) -> application::retry::RetryConfig {
        application::retry::RetryConfig::new(
            self.initial_backoff_ms,
            self.max_backoff_ms,
            self.multiplier,
            self.max_attempts,
        )
    }
}
