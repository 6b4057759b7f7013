//! Signal REST bridge configuration (signal-cli's JSON-RPC HTTP mode, not
//! the raw Unix-socket protocol).

use domain::mask_tail;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Signal REST bridge configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Base URL of the signal-cli REST bridge, e.g. `http://localhost:8081`.
    pub rpc_url: String,

    /// The intermediary phone number (the Signal account the bridge
    /// operates as) used as `account` in inbound envelopes and `number` in
    /// outbound sends.
    pub intermediary_phone_number: String,

    /// Device name registered with the bridge, used during
    /// `initialize_device`.
    #[serde(default = "default_device_name")]
    pub device_name: String,

    /// Shared secret used to verify `X-Webhook-Hmac` on inbound webhooks.
    /// HMAC verification is mandatory for the Signal webhook per spec, so
    /// this field is required (no silent skip as on the WhatsApp side).
    pub webhook_secret: SecretString,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_sec: u64,

    /// Hard cap, in seconds, on a single attachment download during
    /// `receive`, applied independently per attachment.
    #[serde(default = "default_attachment_timeout")]
    pub attachment_download_timeout_sec: u64,
}

impl std::fmt::Debug for SignalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalConfig")
            .field("rpc_url", &self.rpc_url)
            .field("intermediary_phone_number", &mask_tail(&self.intermediary_phone_number, 4))
            .field("device_name", &self.device_name)
            .field("webhook_secret", &"[redacted]")
            .field("http_timeout_sec", &self.http_timeout_sec)
            .field("attachment_download_timeout_sec", &self.attachment_download_timeout_sec)
            .finish()
    }
}

fn default_device_name() -> String {
    "whatsignal".to_string()
}

fn default_http_timeout() -> u64 {
    30
}

fn default_attachment_timeout() -> u64 {
    15
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8081".to_string(),
            intermediary_phone_number: String::new(),
            device_name: default_device_name(),
            webhook_secret: SecretString::from(String::new()),
            http_timeout_sec: default_http_timeout(),
            attachment_download_timeout_sec: default_attachment_timeout(),
        }
    }
}
