//! Application configuration
//!
//! Split into focused sub-modules by domain:
//! - `server`: HTTP server and webhook-pipeline settings
//! - `security`: trusted proxies, outbound TLS policy
//! - `whatsapp`: the WhatsApp HTTP gateway
//! - `signal`: the Signal REST bridge
//! - `database`: SQLite connection pool and janitor retention
//! - `media`: attachment size caps and allowed extensions
//! - `channels`: the configured session/destination pairings
//! - `resilience`: retry and telemetry

mod channels;
mod database;
mod media;
mod resilience;
mod security;
mod server;
mod signal;
mod whatsapp;

use std::collections::HashMap;
use std::fmt;

use domain::{Channel, MessengerSource};
use serde::{Deserialize, Serialize};

pub use channels::{ChannelConfig, load_channels};
pub use database::DatabaseConfig;
pub use media::{AllowedTypesConfig, MaxSizeConfig, MediaConfig};
pub use resilience::{RetryAppConfig, TelemetryAppConfig};
pub use security::SecurityConfig;
pub use server::ServerConfig;
pub use signal::SignalConfig;
pub use whatsapp::WhatsAppConfig;

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Application environment (development or production)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(format!(
                "Invalid environment: {s}. Use 'development' or 'production'"
            )),
        }
    }
}

/// Which messenger platform originated a default-session assumption.
/// Retained as an ambient convenience for CLI/health reporting; the Bridge
/// itself is always bidirectional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessengerSelection {
    #[default]
    WhatsApp,
    Signal,
}

impl MessengerSelection {
    #[must_use]
    pub const fn to_source(self) -> MessengerSource {
        match self {
            Self::WhatsApp => MessengerSource::WhatsApp,
            Self::Signal => MessengerSource::Signal,
        }
    }
}

impl fmt::Display for MessengerSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WhatsApp => write!(f, "whatsapp"),
            Self::Signal => write!(f, "signal"),
        }
    }
}

/// A feature-flag override value: a plain boolean, or a 0-100 rollout
/// percentage, per the spec's "environment variable overrides ... mapping
/// one flag name to a boolean or a rollout percentage".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureFlagValue {
    Enabled(bool),
    RolloutPercent(u8),
}

/// Main application configuration, aggregating every sub-config WhatSignal
/// recognises (spec §6's "Configuration (recognised keys)").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development or production).
    #[serde(default)]
    pub environment: Environment,

    /// Log level, e.g. "info", "debug".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Server/webhook-pipeline configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Trusted proxies and outbound TLS policy.
    #[serde(default)]
    pub security: SecurityConfig,

    /// WhatsApp HTTP gateway configuration.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Signal REST bridge configuration.
    #[serde(default)]
    pub signal: SignalConfig,

    /// SQLite connection pool and janitor retention configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Attachment size caps and allowed extensions.
    #[serde(default)]
    pub media: MediaConfig,

    /// Retry configuration for the Bridge's outbound sends.
    #[serde(default)]
    pub retry: RetryAppConfig,

    /// Telemetry (OpenTelemetry export) configuration.
    #[serde(default)]
    pub telemetry: TelemetryAppConfig,

    /// Configured WhatsApp session ↔ Signal destination pairings.
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,

    /// Feature-flag overrides, sourced from `WHATSIGNAL_FLAG_<NAME>`
    /// environment variables.
    #[serde(default)]
    pub feature_flags: HashMap<String, FeatureFlagValue>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from defaults, an optional TOML file, and
    /// environment variable overrides, in that precedence order.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("WHATSIGNAL_CONFIG").unwrap_or_else(|_| "config".to_string());

        let builder = config::Config::builder()
            .add_source(config::File::with_name(&config_path).required(false))
            .add_source(
                config::Environment::with_prefix("WHATSIGNAL")
                    .separator("__")
                    .try_parsing(true),
            );

        let built = builder.build()?;
        let mut app_config: Self = built.try_deserialize()?;

        if let Ok(flags) = std::env::vars()
            .filter(|(k, _)| k.starts_with("WHATSIGNAL_FLAG_"))
            .map(|(k, v)| {
                let name = k.trim_start_matches("WHATSIGNAL_FLAG_").to_lowercase();
                parse_flag_value(&v).map(|value| (name, value))
            })
            .collect::<Result<Vec<_>, String>>()
        {
            app_config.feature_flags.extend(flags);
        }

        Ok(app_config)
    }

    /// Validate cross-field invariants not expressible via `serde` defaults.
    /// Returns a human-readable reason on failure; the caller maps this to
    /// `ErrConfig` and exit code 1.
    pub fn validate(&self) -> Result<(), String> {
        if self.channels.is_empty() {
            return Err("at least one channel must be configured".to_string());
        }
        if self.signal.intermediary_phone_number.trim().is_empty() {
            return Err("signal.intermediary_phone_number must not be empty".to_string());
        }
        if self.environment == Environment::Production
            && self.whatsapp.webhook_secret.is_none()
        {
            return Err(
                "whatsapp.webhook_secret is required in production".to_string(),
            );
        }
        Ok(())
    }

    /// Build the domain `Channel` list from configured pairings.
    pub fn channels(&self) -> Result<Vec<Channel>, domain::DomainError> {
        load_channels(self.channels.clone())
    }
}

fn parse_flag_value(raw: &str) -> Result<FeatureFlagValue, String> {
    if let Ok(b) = raw.parse::<bool>() {
        return Ok(FeatureFlagValue::Enabled(b));
    }
    if let Ok(pct) = raw.parse::<u8>() {
        if pct <= 100 {
            return Ok(FeatureFlagValue::RolloutPercent(pct));
        }
    }
    Err(format!("invalid feature flag value: {raw}"))
}
