//! Security configuration: trusted proxies and outbound TLS policy.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use super::default_true;

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Trusted proxy IP addresses for X-Forwarded-For header validation
    ///
    /// Only IPs in this list are trusted to set X-Forwarded-For headers.
    /// If empty, the direct connection IP is always used (secure default).
    #[serde(default)]
    pub trusted_proxies: Vec<IpAddr>,

    /// Validate TLS certificates for outbound connections to the gateways.
    #[serde(default = "default_true")]
    pub tls_verify_certs: bool,

    /// Connection timeout in seconds for the WhatsApp/Signal transports.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Minimum TLS version (1.2 or 1.3)
    #[serde(default = "default_min_tls_version")]
    pub min_tls_version: String,
}

const fn default_connection_timeout() -> u64 {
    30
}

fn default_min_tls_version() -> String {
    "1.2".to_string()
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            trusted_proxies: Vec::new(),
            tls_verify_certs: true,
            connection_timeout_secs: default_connection_timeout(),
            min_tls_version: default_min_tls_version(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_secure() {
        let config = SecurityConfig::default();
        assert!(config.tls_verify_certs);
        assert!(config.trusted_proxies.is_empty());
    }
}
