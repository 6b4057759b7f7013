//! Request context for propagating tracing correlation metadata
//!
//! Every inbound webhook receives a `request_id`, a 128-bit `trace_id`, and
//! a 64-bit `span_id`, all hex-encoded. The triple, plus `start_time`, is
//! threaded through every downstream call so log records emitted during
//! that request carry the same correlation fields. Nested sub-operations
//! open a child span with a fresh `span_id` while inheriting `trace_id`.
//!
//! # Examples
//!
//! ```
//! use application::RequestContext;
//!
//! let ctx = RequestContext::new();
//! let child = ctx.child_span();
//! assert_eq!(ctx.trace_id(), child.trace_id());
//! assert_ne!(ctx.span_id(), child.span_id());
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use rand::RngCore;

/// A 128-bit trace identifier, hex-encoded for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId([u8; 16]);

/// A 64-bit span identifier, hex-encoded for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId([u8; 8]);

impl TraceId {
    /// Generate a cryptographically random, non-zero trace id.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        loop {
            rand::thread_rng().fill_bytes(&mut bytes);
            if bytes.iter().any(|b| *b != 0) {
                return Self(bytes);
            }
        }
    }

    /// Construct a trace id from externally-sourced bytes (e.g. an
    /// upstream tracing pipeline), rejecting an all-zero id.
    pub fn from_bytes(bytes: [u8; 16]) -> Option<Self> {
        bytes.iter().any(|b| *b != 0).then_some(Self(bytes))
    }
}

impl SpanId {
    /// Generate a cryptographically random, non-zero span id.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 8];
        loop {
            rand::thread_rng().fill_bytes(&mut bytes);
            if bytes.iter().any(|b| *b != 0) {
                return Self(bytes);
            }
        }
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Per-inbound-request correlation context, threaded through every
/// downstream call made while handling that request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    trace_id: TraceId,
    span_id: SpanId,
    start_time: DateTime<Utc>,
}

impl RequestContext {
    /// Create a fresh context with locally-generated IDs.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: generate_request_id(),
            trace_id: TraceId::generate(),
            span_id: SpanId::generate(),
            start_time: Utc::now(),
        }
    }

    /// Create a context sourced from an external tracing pipeline: the
    /// trace id is taken from upstream rather than generated locally.
    #[must_use]
    pub fn from_external_trace(trace_id: TraceId) -> Self {
        Self {
            request_id: generate_request_id(),
            trace_id,
            span_id: SpanId::generate(),
            start_time: Utc::now(),
        }
    }

    /// Restore a context with all fields specified (testing, or
    /// reconstructing from a propagated header set).
    #[must_use]
    pub fn restore(
        request_id: String,
        trace_id: TraceId,
        span_id: SpanId,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            request_id,
            trace_id,
            span_id,
            start_time,
        }
    }

    /// Open a child span for a nested sub-operation: a new `span_id`, the
    /// same `request_id` and `trace_id`.
    #[must_use]
    pub fn child_span(&self) -> Self {
        Self {
            request_id: self.request_id.clone(),
            trace_id: self.trace_id,
            span_id: SpanId::generate(),
            start_time: Utc::now(),
        }
    }

    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    #[must_use]
    pub const fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    #[must_use]
    pub const fn span_id(&self) -> SpanId {
        self.span_id
    }

    #[must_use]
    pub const fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Elapsed time since this context was created.
    #[must_use]
    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.start_time
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

fn generate_request_id() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("req_{}", hex::encode(bytes))
}
