//! Server composition root
//!
//! Load and validate configuration, open the encrypted mapping store, wire
//! the two transport clients and the Bridge, then serve webhooks until a
//! shutdown signal arrives. Exposed as a function (rather than only a
//! `main`) so `presentation_cli`'s `run` subcommand can start the server
//! in-process without shelling out to the `whatsignal-server` binary.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use application::ChannelRegistry;
use application::ports::TransportClient;
use application::services::{Bridge, MessageService, MessageServiceConfig};
use domain::MediaRouter;
use infrastructure::{AppConfig, ChaChaEncryptionAdapter, SqliteMappingStore, create_pool};
use integration_signal::{SignalClient, SignalClientConfig};
use integration_whatsapp::{WhatsAppClient, WhatsAppClientConfig};
use sha2::{Digest, Sha256};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config_reload::{self, ReloadableConfig};
use crate::handlers::metrics::MetricsCollector;
use crate::middleware::{RateLimiterConfig, RateLimiterLayer, RequestIdLayer, SecurityHeadersLayer};
use crate::state::AppState;
use crate::{routes, spawn_conversation_cleanup_task, spawn_rate_limiter_cleanup_task};

const ENCRYPTION_KEY_ENV: &str = "WHATSIGNAL_ENCRYPTION_KEY";

/// Validate `config`, wire the relay, and serve webhooks until shutdown.
///
/// Returns a process exit code rather than `Result` because each failure
/// mode has its own documented exit status (config error: 1, database
/// error: 2, bind error: 3, serve error: 4), matching the CLI's `migrate`/
/// `check-config` convention of distinct codes per failure class.
pub async fn run(config: AppConfig) -> std::process::ExitCode {
    info!("whatsignal v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config.validate() {
        error!("configuration error: {e}");
        return std::process::ExitCode::from(1);
    }

    let encryption_key_hex = match std::env::var(ENCRYPTION_KEY_ENV) {
        Ok(v) => v,
        Err(_) => {
            error!("{ENCRYPTION_KEY_ENV} is not set");
            return std::process::ExitCode::from(1);
        },
    };
    let encryption_key = match hex::decode(encryption_key_hex.trim()) {
        Ok(k) => k,
        Err(e) => {
            error!("{ENCRYPTION_KEY_ENV} is not valid hex: {e}");
            return std::process::ExitCode::from(1);
        },
    };

    let encryption = match ChaChaEncryptionAdapter::new(&encryption_key) {
        Ok(enc) => Arc::new(enc),
        Err(e) => {
            error!("failed to initialise encryption: {e}");
            return std::process::ExitCode::from(1);
        },
    };
    let index_key = Sha256::digest([encryption_key.as_slice(), b"whatsignal-blind-index"].concat()).to_vec();

    let pool = match create_pool(&config.database) {
        Ok(pool) => Arc::new(pool),
        Err(e) => {
            error!("failed to open database: {e}");
            return std::process::ExitCode::from(2);
        },
    };

    let mapping_store: Arc<dyn application::ports::MappingStorePort> =
        Arc::new(SqliteMappingStore::new(pool, encryption, index_key));

    let channels = match config.channels() {
        Ok(c) => c,
        Err(e) => {
            error!("invalid channel configuration: {e}");
            return std::process::ExitCode::from(1);
        },
    };
    let channel_registry = match ChannelRegistry::new(&channels) {
        Ok(r) => Arc::new(r),
        Err(e) => {
            error!("invalid channel registry: {e}");
            return std::process::ExitCode::from(1);
        },
    };

    let whatsapp_client = match WhatsAppClient::new(WhatsAppClientConfig {
        api_base_url: config.whatsapp.api_base_url.clone(),
        default_session: config.whatsapp.default_session.clone(),
        http_timeout_sec: config.whatsapp.http_timeout_sec,
    }) {
        Ok(c) => c,
        Err(e) => {
            error!("failed to initialise whatsapp client: {e}");
            return std::process::ExitCode::from(1);
        },
    };
    let whatsapp_transport: Arc<dyn TransportClient> = Arc::new(whatsapp_client);

    let signal_client = match SignalClient::new(SignalClientConfig {
        rpc_url: config.signal.rpc_url.clone(),
        intermediary_phone_number: config.signal.intermediary_phone_number.clone(),
        device_name: config.signal.device_name.clone(),
        http_timeout_sec: config.signal.http_timeout_sec,
        attachment_download_timeout_sec: config.signal.attachment_download_timeout_sec,
    }) {
        Ok(c) => c,
        Err(e) => {
            error!("failed to initialise signal client: {e}");
            return std::process::ExitCode::from(1);
        },
    };
    let signal_transport: Arc<dyn TransportClient> = Arc::new(signal_client);

    let media_router = Arc::new(MediaRouter::new(
        &config.media.allowed_types.image,
        &config.media.allowed_types.video,
        &config.media.allowed_types.voice,
        &config.media.allowed_types.document,
        &config.media.max_size_mb.as_category_map(),
    ));

    let retry_config = config.retry.to_retry_config();
    let bridge = Arc::new(Bridge::new(
        Arc::clone(&channel_registry),
        Arc::clone(&mapping_store),
        Arc::clone(&whatsapp_transport),
        Arc::clone(&signal_transport),
        media_router,
        retry_config,
    ));

    let message_service = Arc::new(MessageService::new(
        Arc::clone(&bridge),
        Arc::clone(&mapping_store),
        MessageServiceConfig {
            relay_self_outbound: false,
            default_session: Some(config.whatsapp.default_session.clone()),
        },
    ));

    let metrics = Arc::new(MetricsCollector::new());

    let rate_limiter_layer = RateLimiterLayer::new(&RateLimiterConfig {
        enabled: config.server.rate_limit_per_minute > 0,
        limit: config.server.rate_limit_per_minute,
        window: Duration::from_millis(config.server.rate_limit_window_ms),
    });
    let rate_limiter_state = rate_limiter_layer.state();

    let reloadable_config = config_reload::spawn_config_reload_handler(ReloadableConfig::new(config.clone()));

    let state = AppState {
        mapping_store: Arc::clone(&mapping_store),
        channel_registry,
        whatsapp_transport,
        signal_transport,
        bridge,
        message_service,
        config: reloadable_config,
        metrics,
        rate_limiter: Arc::clone(&rate_limiter_state),
    };

    let cleanup_handle = spawn_conversation_cleanup_task(
        mapping_store,
        config.database.retention_days,
        Duration::from_secs(config.server.cleanup_interval_hours * 3600),
    );
    let rate_limiter_cleanup_handle = spawn_rate_limiter_cleanup_task(
        rate_limiter_state,
        Duration::from_secs(config.server.rate_limit_cleanup_minutes * 60),
    );

    let app = routes::create_router(state, config.server.webhook_max_bytes, rate_limiter_layer)
        .layer(SecurityHeadersLayer::new())
        .layer(RequestIdLayer::new());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("failed to bind {addr}: {e}");
            cleanup_handle.abort();
            rate_limiter_cleanup_handle.abort();
            return std::process::ExitCode::from(3);
        },
    };

    info!("listening on http://{addr}");

    let serve_result = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    cleanup_handle.abort();
    rate_limiter_cleanup_handle.abort();

    match serve_result {
        Ok(()) => {
            info!("shutdown complete");
            std::process::ExitCode::from(0)
        },
        Err(e) => {
            error!("server error: {e}");
            std::process::ExitCode::from(4)
        },
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, draining in-flight requests");
}
