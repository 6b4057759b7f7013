//! Messenger source - Identifies the messaging platform

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported messaging platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessengerSource {
    /// Meta's WhatsApp Business API
    WhatsApp,
    /// Signal via signal-cli
    Signal,
}

impl MessengerSource {
    /// Get the display name for this messenger
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::WhatsApp => "WhatsApp",
            Self::Signal => "Signal",
        }
    }

    /// Get the config key for this messenger
    #[must_use]
    pub const fn config_key(&self) -> &'static str {
        match self {
            Self::WhatsApp => "whatsapp",
            Self::Signal => "signal",
        }
    }

    /// Parse from config string (case-insensitive)
    #[must_use]
    pub fn from_config(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "whatsapp" => Some(Self::WhatsApp),
            "signal" => Some(Self::Signal),
            _ => None,
        }
    }
}

impl fmt::Display for MessengerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl Default for MessengerSource {
    fn default() -> Self {
        Self::WhatsApp
    }
}
