//! Error types for the Signal REST bridge client

use thiserror::Error;

use application::WhatSignalError;

/// Errors that can occur talking to the signal-cli REST bridge.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("bridge error: {status} - {body}")]
    Bridge { status: u16, body: String },

    #[error("missing configuration: {0}")]
    Configuration(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("attachment download failed: {0}")]
    AttachmentDownloadFailed(String),

    #[error("device not registered")]
    NotRegistered,
}

impl From<SignalError> for WhatSignalError {
    fn from(err: SignalError) -> Self {
        match err {
            SignalError::Request(e) => Self::Transport(e.to_string()),
            SignalError::Bridge { status, body } if (500..600).contains(&status) => {
                Self::Transport(format!("bridge {status}: {body}"))
            },
            SignalError::Bridge { status, body } => Self::Protocol(format!("bridge {status}: {body}")),
            SignalError::Configuration(msg) => Self::Config(msg),
            SignalError::InvalidTimestamp(msg) => Self::Protocol(msg),
            SignalError::AttachmentDownloadFailed(msg) => Self::Transport(msg),
            SignalError::NotRegistered => Self::ChannelNotFound("signal device not registered".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_5xx_display() {
        let err = SignalError::Bridge { status: 503, body: "busy".to_string() };
        assert_eq!(err.to_string(), "bridge error: 503 - busy");
    }

    #[test]
    fn bridge_5xx_maps_to_transport() {
        let err = SignalError::Bridge { status: 502, body: "oops".to_string() };
        assert!(matches!(WhatSignalError::from(err), WhatSignalError::Transport(_)));
    }

    #[test]
    fn bridge_4xx_maps_to_protocol() {
        let err = SignalError::Bridge { status: 400, body: "bad".to_string() };
        assert!(matches!(WhatSignalError::from(err), WhatSignalError::Protocol(_)));
    }

    #[test]
    fn not_registered_maps_to_channel_not_found() {
        assert!(matches!(
            WhatSignalError::from(SignalError::NotRegistered),
            WhatSignalError::ChannelNotFound(_)
        ));
    }
}
