#![forbid(unsafe_code)]
//! Infrastructure layer - adapters for external systems
//!
//! Implements the ports defined in `application`: encrypted SQLite
//! persistence for the Mapping Store, layered configuration, correlated
//! HTTP client plumbing shared by the transport integrations, and telemetry
//! bootstrap.

pub mod adapters;
pub mod config;
pub mod http;
pub mod persistence;
pub mod telemetry;

pub use adapters::ChaChaEncryptionAdapter;
pub use config::{
    AppConfig, ChannelConfig, DatabaseConfig, Environment, FeatureFlagValue, MediaConfig,
    MessengerSelection, RetryAppConfig, SecurityConfig, ServerConfig, SignalConfig,
    TelemetryAppConfig, WhatsAppConfig,
};
pub use http::{CorrelatedClientConfig, CorrelatedHttpClient, RequestIdProvider, X_REQUEST_ID};
pub use persistence::{ConnectionPool, DatabaseError, SqliteMappingStore, create_pool};
pub use telemetry::{TelemetryConfig, TelemetryGuard, init_telemetry};
