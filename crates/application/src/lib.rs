//! Application layer — use cases and orchestration
//!
//! Contains the Bridge and Message Service use cases, port definitions
//! implemented by `infrastructure` and the `integration_*` crates, and the
//! cross-cutting pieces (retry, request context, channel registry) they
//! share. This layer depends only on `domain`.

pub mod channel_registry;
pub mod error;
pub mod events;
pub mod ports;
pub mod request_context;
pub mod retry;
pub mod services;

pub use channel_registry::ChannelRegistry;
pub use error::WhatSignalError;
pub use events::{InboundMedia, RawInboundEvent, ReactionInfo};
pub use request_context::{RequestContext, SpanId, TraceId};
pub use services::*;
