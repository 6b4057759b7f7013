//! WhatsApp HTTP gateway configuration (wwebjs-style gateway, not Meta's
//! Graph API: a thin REST wrapper over a browser-automated WhatsApp Web
//! session, addressed by `session` name).

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::default_true;

/// WhatsApp gateway configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// Base URL of the gateway, e.g. `http://localhost:3001`.
    pub api_base_url: String,

    /// Shared secret used to verify `X-Webhook-Hmac` on inbound webhooks.
    /// Required in production; absent means signature verification is
    /// skipped (development convenience only).
    #[serde(default)]
    pub webhook_secret: Option<SecretString>,

    /// Interval, in seconds, between gateway session health probes.
    #[serde(default = "default_health_check_sec")]
    pub session_health_check_sec: u64,

    /// Whether a session found unhealthy should be restarted automatically.
    #[serde(default = "default_true")]
    pub session_auto_restart: bool,

    /// Whether to sync the contact directory once at startup.
    #[serde(default = "default_true")]
    pub contact_sync_on_startup: bool,

    /// How long, in hours, a cached contact is considered fresh.
    #[serde(default = "default_contact_cache_hours")]
    pub contact_cache_hours: u64,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_sec: u64,

    /// The default session name for events that omit one.
    #[serde(default = "default_session_name")]
    pub default_session: String,
}

impl std::fmt::Debug for WhatsAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppConfig")
            .field("api_base_url", &self.api_base_url)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "[redacted]"))
            .field("session_health_check_sec", &self.session_health_check_sec)
            .field("session_auto_restart", &self.session_auto_restart)
            .field("contact_sync_on_startup", &self.contact_sync_on_startup)
            .field("contact_cache_hours", &self.contact_cache_hours)
            .field("http_timeout_sec", &self.http_timeout_sec)
            .field("default_session", &self.default_session)
            .finish()
    }
}

fn default_health_check_sec() -> u64 {
    60
}

fn default_contact_cache_hours() -> u64 {
    24
}

fn default_http_timeout() -> u64 {
    30
}

fn default_session_name() -> String {
    "default".to_string()
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3001".to_string(),
            webhook_secret: None,
            session_health_check_sec: default_health_check_sec(),
            session_auto_restart: true,
            contact_sync_on_startup: true,
            contact_cache_hours: default_contact_cache_hours(),
            http_timeout_sec: default_http_timeout(),
            default_session: default_session_name(),
        }
    }
}
