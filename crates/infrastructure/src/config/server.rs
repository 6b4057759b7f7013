//! HTTP server and webhook-pipeline configuration.

use serde::{Deserialize, Serialize};

use super::default_true;

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Read timeout in seconds
    #[serde(default = "default_read_timeout")]
    pub read_timeout_sec: u64,

    /// Write timeout in seconds; also bounds graceful-shutdown drain
    #[serde(default = "default_write_timeout")]
    pub write_timeout_sec: u64,

    /// Idle keep-alive timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_sec: u64,

    /// Maximum allowed clock skew, in seconds, between `X-Webhook-Timestamp`
    /// and the server's own clock before HMAC verification rejects a request.
    #[serde(default = "default_webhook_max_skew")]
    pub webhook_max_skew_sec: i64,

    /// Maximum accepted webhook request body size in bytes (413 beyond this).
    #[serde(default = "default_webhook_max_bytes")]
    pub webhook_max_bytes: usize,

    /// Requests per minute allowed per client IP by the fixed-window limiter.
    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: u32,

    /// Fixed window size in milliseconds. Ambient knob; spec only names the
    /// per-minute limit, so the window itself defaults to 60s.
    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: u64,

    /// How often, in minutes, an ambient background sweep additionally
    /// evicts stale rate-limiter buckets (on top of the mandatory per-call
    /// lazy eviction the algorithm itself performs).
    #[serde(default = "default_rate_limit_cleanup_minutes")]
    pub rate_limit_cleanup_minutes: u64,

    /// How often, in hours, the Mapping Store janitor runs.
    #[serde(default = "default_cleanup_interval_hours")]
    pub cleanup_interval_hours: u64,

    /// Enable CORS on the webhook/health/metrics router.
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (empty = allow all).
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Log format: "json" for structured logs, "text" for human-readable.
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

const fn default_read_timeout() -> u64 {
    30
}

const fn default_write_timeout() -> u64 {
    30
}

const fn default_idle_timeout() -> u64 {
    120
}

const fn default_webhook_max_skew() -> i64 {
    300
}

const fn default_webhook_max_bytes() -> usize {
    20 * 1024 * 1024
}

const fn default_rate_limit_per_minute() -> u32 {
    60
}

const fn default_rate_limit_window_ms() -> u64 {
    60_000
}

const fn default_rate_limit_cleanup_minutes() -> u64 {
    5
}

const fn default_cleanup_interval_hours() -> u64 {
    24
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            read_timeout_sec: default_read_timeout(),
            write_timeout_sec: default_write_timeout(),
            idle_timeout_sec: default_idle_timeout(),
            webhook_max_skew_sec: default_webhook_max_skew(),
            webhook_max_bytes: default_webhook_max_bytes(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
            rate_limit_window_ms: default_rate_limit_window_ms(),
            rate_limit_cleanup_minutes: default_rate_limit_cleanup_minutes(),
            cleanup_interval_hours: default_cleanup_interval_hours(),
            cors_enabled: true,
            allowed_origins: Vec::new(),
            log_format: default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.rate_limit_per_minute, 60);
        assert_eq!(config.rate_limit_window_ms, 60_000);
    }
}
