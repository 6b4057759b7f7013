//! WhatSignal HTTP presentation layer
//!
//! Webhook ingestion, health/metrics endpoints, and the retention cleanup
//! task sit in this crate; everything downstream of "a webhook arrived" is
//! [`application::services::MessageService`] and [`application::services::Bridge`].

pub mod config_reload;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod tasks;

pub use config_reload::{ReloadableConfig, spawn_config_reload_handler};
pub use error::ApiError;
pub use middleware::{
    RateLimiterConfig, RateLimiterLayer, RateLimiterState, RequestId, RequestIdLayer, SecurityHeadersLayer,
    spawn_rate_limiter_cleanup_task,
};
pub use routes::create_router;
pub use server::run;
pub use state::AppState;
pub use tasks::spawn_conversation_cleanup_task;
