//! HTTP middleware components
//!
//! This module contains middleware for rate limiting, request correlation,
//! and security headers.

pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use rate_limit::{
    RateLimiter, RateLimiterConfig, RateLimiterLayer, RateLimiterState, spawn_rate_limiter_cleanup_task,
};
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdLayer};
pub use security_headers::SecurityHeadersLayer;
