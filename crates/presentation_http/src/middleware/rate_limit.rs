//! Rate limiting middleware
//!
//! Fixed-window limiter keyed by client IP: each IP gets a counter that
//! resets every `window` and is denied once it exceeds `limit` for that
//! window. A limit of zero denies every request unconditionally.

use std::{
    collections::HashMap,
    future::Future,
    net::IpAddr,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request},
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;
use tower::{Layer, Service};

use crate::error::ApiError;

/// Rate limiter configuration
#[derive(Clone, Debug)]
pub struct RateLimiterConfig {
    /// Maximum requests allowed per window
    pub limit: u32,
    /// Window duration
    pub window: Duration,
    /// Enable rate limiting
    pub enabled: bool,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            limit: 60,
            window: Duration::from_secs(60),
            enabled: true,
        }
    }
}

/// Fixed-window counter for a single IP
#[derive(Debug, Clone)]
struct Window {
    count: u32,
    window_start: Instant,
}

/// Shared rate limiter state
#[derive(Debug)]
pub struct RateLimiterState {
    windows: RwLock<HashMap<IpAddr, Window>>,
    limit: u32,
    window: Duration,
}

impl RateLimiterState {
    /// Create a new rate limiter state
    #[must_use]
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            windows: RwLock::new(HashMap::new()),
            limit,
            window,
        }
    }

    /// Check if a request from the given IP is allowed in the current window.
    ///
    /// Also sweeps every entry whose window is more than `2 * window` stale,
    /// under the same write lock as the allow-check, so memory is bounded by
    /// the active set even if [`spawn_rate_limiter_cleanup_task`]'s periodic
    /// sweep never runs.
    pub async fn check(&self, ip: IpAddr) -> bool {
        if self.limit == 0 {
            return false;
        }

        let now = Instant::now();
        let mut windows = self.windows.write().await;

        let stale_before = self.window * 2;
        windows.retain(|_, w| now.duration_since(w.window_start) < stale_before);

        let entry = windows.entry(ip).or_insert_with(|| Window {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= self.window {
            entry.window_start = now;
            entry.count = 0;
        }

        if entry.count >= self.limit {
            false
        } else {
            entry.count += 1;
            true
        }
    }

    /// Evict windows that ended more than `older_than` ago
    pub async fn cleanup(&self, older_than: Duration) {
        let mut windows = self.windows.write().await;
        let cutoff = Instant::now().checked_sub(older_than).unwrap_or_else(Instant::now);
        windows.retain(|_, w| w.window_start > cutoff);
    }
}

/// Spawn a periodic sweep of stale rate-limiter windows
pub fn spawn_rate_limiter_cleanup_task(
    state: Arc<RateLimiterState>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            state.cleanup(interval * 2).await;
        }
    })
}

/// Layer that applies rate limiting
#[derive(Clone, Debug)]
pub struct RateLimiterLayer {
    state: Arc<RateLimiterState>,
    enabled: bool,
    excluded_paths: Vec<String>,
}

impl RateLimiterLayer {
    /// Create a new rate limiter layer
    #[must_use]
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self {
            state: Arc::new(RateLimiterState::new(config.limit, config.window)),
            enabled: config.enabled,
            excluded_paths: vec!["/health".to_string()],
        }
    }

    /// Build the layer from a pre-existing shared state, so the cleanup task
    /// and the request path observe the same counters.
    #[must_use]
    pub fn from_state(state: Arc<RateLimiterState>, enabled: bool) -> Self {
        Self {
            state,
            enabled,
            excluded_paths: vec!["/health".to_string()],
        }
    }

    /// Add paths that should be excluded from rate limiting
    #[must_use]
    pub fn exclude_paths(mut self, paths: Vec<String>) -> Self {
        self.excluded_paths.extend(paths);
        self
    }

    /// Get a reference to the rate limiter state for cleanup tasks
    #[must_use]
    pub fn state(&self) -> Arc<RateLimiterState> {
        Arc::clone(&self.state)
    }
}

impl<S> Layer<S> for RateLimiterLayer {
    type Service = RateLimiter<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimiter {
            inner,
            state: Arc::clone(&self.state),
            enabled: self.enabled,
            excluded_paths: self.excluded_paths.clone(),
        }
    }
}

/// Middleware service for rate limiting
#[derive(Clone, Debug)]
pub struct RateLimiter<S> {
    inner: S,
    state: Arc<RateLimiterState>,
    enabled: bool,
    excluded_paths: Vec<String>,
}

impl<S> Service<Request> for RateLimiter<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let enabled = self.enabled;
        let state = Arc::clone(&self.state);
        let excluded_paths = self.excluded_paths.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !enabled {
                return inner.call(req).await;
            }

            let path = req.uri().path();
            if excluded_paths.iter().any(|p| path.starts_with(p)) {
                return inner.call(req).await;
            }

            let client_ip = extract_client_ip(&req);

            if state.check(client_ip).await {
                inner.call(req).await
            } else {
                Ok(ApiError::RateLimited.into_response())
            }
        })
    }
}

/// Extract the originating client IP: first hop of `X-Forwarded-For`, then
/// `X-Real-IP`, then the TCP peer address (with the port stripped).
fn extract_client_ip(req: &Request) -> IpAddr {
    if let Some(forwarded) = req.headers().get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(ip_str) = forwarded.split(',').next() {
            if let Ok(ip) = ip_str.trim().parse::<IpAddr>() {
                return ip;
            }
        }
    }

    if let Some(real_ip) = req.headers().get("x-real-ip").and_then(|v| v.to_str().ok()) {
        if let Ok(ip) = real_ip.trim().parse::<IpAddr>() {
            return ip;
        }
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<std::net::SocketAddr>>() {
        return addr.ip();
    }

    IpAddr::V4(std::net::Ipv4Addr::LOCALHOST)
}
