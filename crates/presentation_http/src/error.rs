//! API error handling
//!
//! Maps [`application::WhatSignalError`] onto HTTP status codes per the
//! error-taxonomy table: transport failures are retried inside the bridge
//! before they ever reach here, so anything still carrying `Transport` means
//! retries were exhausted.

use application::WhatSignalError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("rate limited")]
    RateLimited,

    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("unsupported media: {0}")]
    UnsupportedMedia(String),

    #[error("bad gateway: {0}")]
    BadGateway(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone(), None),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "rate limit exceeded".to_string(),
                None,
            ),
            Self::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                msg.clone(),
                None,
            ),
            Self::UnsupportedMedia(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_media",
                msg.clone(),
                None,
            ),
            Self::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "bad_gateway", msg.clone(), None),
            Self::Cancelled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "cancelled",
                "request cancelled".to_string(),
                None,
            ),
            Self::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "an internal error occurred".to_string(),
                Some(msg.clone()),
            ),
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<WhatSignalError> for ApiError {
    fn from(err: WhatSignalError) -> Self {
        match err {
            WhatSignalError::Config(msg) => Self::Internal(msg),
            WhatSignalError::Transport(msg) => Self::BadGateway(msg),
            WhatSignalError::Protocol(msg) => Self::BadGateway(msg),
            WhatSignalError::MappingNotFound(msg)
            | WhatSignalError::ChannelNotFound(msg)
            | WhatSignalError::ChatKindMismatch(msg)
            | WhatSignalError::NoRoute(msg) => Self::Internal(msg),
            WhatSignalError::MediaTooLarge(msg) => Self::UnsupportedMedia(msg),
            WhatSignalError::MediaType(msg) => Self::UnsupportedMedia(msg),
            WhatSignalError::RateLimited => Self::RateLimited,
            WhatSignalError::Auth(msg) => Self::Unauthorized(msg),
            WhatSignalError::Cancelled => Self::Cancelled,
            WhatSignalError::Domain(e) => Self::BadRequest(e.to_string()),
            WhatSignalError::Internal(msg) => Self::Internal(msg),
        }
    }
}
