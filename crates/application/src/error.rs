//! The WhatSignal error taxonomy (spec §7)

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur anywhere in the relay's application layer.
///
/// Each variant maps to exactly one outcome at the webhook surface (see
/// `presentation_http::error::ApiError`) and to a retry/terminal
/// classification inside the Bridge (see [`WhatSignalError::is_retryable`]).
#[derive(Debug, Error)]
pub enum WhatSignalError {
    /// Invalid configuration; fatal at startup, surfaced on reload attempts.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network error or 5xx from either gateway; retriable by the Bridge.
    #[error("transport error: {0}")]
    Transport(String),

    /// 4xx or malformed response from a transport; terminal.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A quoted/reacted-to message has no known mapping.
    #[error("mapping not found for {0}")]
    MappingNotFound(String),

    /// The event names a session or destination with no configured channel.
    #[error("channel not found for {0}")]
    ChannelNotFound(String),

    /// A reply's resolved mapping is a direct chat while the source is a
    /// group, or vice versa.
    #[error("chat kind mismatch: {0}")]
    ChatKindMismatch(String),

    /// Fallback routing found no candidate mapping to route through.
    #[error("no route: {0}")]
    NoRoute(String),

    /// An attachment exceeded its category's configured size cap.
    #[error("media too large: {0}")]
    MediaTooLarge(String),

    /// An attachment's media type could not be handled.
    #[error("unsupported media type: {0}")]
    MediaType(String),

    /// The caller exceeded its rate-limit allowance.
    #[error("rate limited")]
    RateLimited,

    /// HMAC signature mismatch or clock-skew beyond the configured window.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The operation was cancelled (client disconnect, shutdown deadline).
    #[error("cancelled")]
    Cancelled,

    /// A lower-layer domain validation error.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Catch-all for unexpected internal failures.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WhatSignalError {
    /// Whether the Bridge should retry the operation that produced this
    /// error. Only transport-level failures (network, 5xx) are retryable;
    /// everything else — including protocol (4xx), routing failures, and
    /// cancellation — is terminal.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
