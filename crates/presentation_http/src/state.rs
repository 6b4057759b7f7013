//! Application state shared across handlers

use std::sync::Arc;

use application::ChannelRegistry;
use application::ports::{MappingStorePort, TransportClient};
use application::services::{Bridge, MessageService};

use crate::{config_reload::ReloadableConfig, handlers::metrics::MetricsCollector, middleware::RateLimiterState};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Encrypted persistence for message/contact mappings
    pub mapping_store: Arc<dyn MappingStorePort>,
    /// Session-to-destination routing table
    pub channel_registry: Arc<ChannelRegistry>,
    /// WhatsApp gateway transport
    pub whatsapp_transport: Arc<dyn TransportClient>,
    /// Signal bridge transport
    pub signal_transport: Arc<dyn TransportClient>,
    /// Cross-messenger relay orchestration
    pub bridge: Arc<Bridge>,
    /// Event classification and ack handling
    pub message_service: Arc<MessageService>,
    /// Reloadable application configuration
    pub config: ReloadableConfig,
    /// Metrics collector
    pub metrics: Arc<MetricsCollector>,
    /// Per-IP fixed-window rate limiter state, shared with the cleanup task
    pub rate_limiter: Arc<RateLimiterState>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("mapping_store", &"<MappingStorePort>")
            .field("channel_registry_len", &self.channel_registry.len())
            .field("whatsapp_transport", &"<TransportClient>")
            .field("signal_transport", &"<TransportClient>")
            .field("bridge", &"<Bridge>")
            .field("message_service", &"<MessageService>")
            .field("config", &self.config)
            .field("metrics", &"<MetricsCollector>")
            .field("rate_limiter", &"<RateLimiterState>")
            .finish()
    }
}
