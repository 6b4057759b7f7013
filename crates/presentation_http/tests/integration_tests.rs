//! End-to-end webhook scenarios driven straight through the router, with a
//! real (in-memory) `SqliteMappingStore` and a hand-rolled transport double
//! for each platform. Mirrors the acceptance scenarios used to validate the
//! relay's message-identity guarantees.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use application::WhatSignalError;
use application::ports::{MappingStorePort, MediaPayload, SendTarget, SentMessage, TransportClient};
use application::services::{Bridge, MessageService, MessageServiceConfig};
use application::{ChannelRegistry, retry::RetryConfig};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain::{Channel, MediaRouter, SessionName};
use hmac::{Hmac, Mac};
use infrastructure::config::{ServerConfig, SignalConfig, WhatsAppConfig};
use infrastructure::{AppConfig, ChaChaEncryptionAdapter, SqliteMappingStore, create_pool};
use presentation_http::handlers::metrics::MetricsCollector;
use presentation_http::middleware::{RateLimiterConfig, RateLimiterLayer};
use presentation_http::routes::create_router;
use presentation_http::state::AppState;
use presentation_http::ReloadableConfig;
use secrecy::SecretString;
use serde_json::Value;
use sha2::Sha256;
use tower::ServiceExt;

type HmacSha256 = Hmac<Sha256>;

const SIGNAL_SECRET: &str = "signal-test-secret";
const SESSION: &str = "personal";
const DESTINATION: &str = "+1111111111";

/// Records every call made against it; never talks to a real network.
struct RecordingTransport {
    sent: Mutex<Vec<(String, String)>>,
    reactions: Mutex<Vec<(String, String)>>,
    next_id: AtomicU64,
}

impl RecordingTransport {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            reactions: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn sent_texts(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    fn reactions(&self) -> Vec<(String, String)> {
        self.reactions.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransportClient for RecordingTransport {
    async fn send_text(&self, target: &SendTarget, body: &str) -> Result<SentMessage, WhatSignalError> {
        self.sent.lock().unwrap().push((target.session_or_destination.clone(), body.to_string()));
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let timestamp = 1_700_000_100 + i64::try_from(id).unwrap();
        // Signal identifies a sent message by its send timestamp, not a
        // separate id; quotes and reactions reference it as a string.
        Ok(SentMessage { message_id: timestamp.to_string(), timestamp })
    }

    async fn send_media(
        &self,
        _target: &SendTarget,
        _media: &MediaPayload,
        _caption: Option<&str>,
    ) -> Result<SentMessage, WhatSignalError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let timestamp = 1_700_000_100 + i64::try_from(id).unwrap();
        Ok(SentMessage { message_id: timestamp.to_string(), timestamp })
    }

    async fn send_reaction(&self, target: &SendTarget, message_id: &str, emoji: &str) -> Result<(), WhatSignalError> {
        self.reactions.lock().unwrap().push((message_id.to_string(), emoji.to_string()));
        let _ = &target.session_or_destination;
        Ok(())
    }

    async fn delete(&self, _target: &SendTarget, _message_id: &str) -> Result<(), WhatSignalError> {
        Ok(())
    }

    async fn ack(&self, _target: &SendTarget, _message_id: &str) -> Result<(), WhatSignalError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<(), WhatSignalError> {
        Ok(())
    }
}

struct Harness {
    app: axum::Router,
    whatsapp: Arc<RecordingTransport>,
    signal: Arc<RecordingTransport>,
    mapping_store: Arc<SqliteMappingStore>,
}

fn build_harness() -> Harness {
    build_harness_with(RateLimiterConfig { enabled: false, limit: 1000, window: std::time::Duration::from_secs(60) }, 10 * 1024 * 1024)
}

fn build_harness_with(rate_limiter_config: RateLimiterConfig, max_body_bytes: usize) -> Harness {
    let channel = Channel::new(SessionName::new(SESSION).unwrap(), DESTINATION.to_string()).unwrap();
    let channel_registry = Arc::new(ChannelRegistry::new(&[channel]).unwrap());

    let encryption = Arc::new(ChaChaEncryptionAdapter::new(&ChaChaEncryptionAdapter::generate_key()).unwrap());
    let database = infrastructure::config::DatabaseConfig { path: ":memory:".to_string(), ..Default::default() };
    let pool = Arc::new(create_pool(&database).unwrap());
    let mapping_store = Arc::new(SqliteMappingStore::new(pool, encryption, b"test-index-key".to_vec()));
    let mapping_store_port: Arc<dyn application::ports::MappingStorePort> = mapping_store.clone();

    let whatsapp = Arc::new(RecordingTransport::new());
    let signal = Arc::new(RecordingTransport::new());
    let whatsapp_transport: Arc<dyn TransportClient> = whatsapp.clone();
    let signal_transport: Arc<dyn TransportClient> = signal.clone();

    let media_router = Arc::new(MediaRouter::new(&[], &[], &[], &[], &std::collections::HashMap::new()));

    let bridge = Arc::new(Bridge::new(
        Arc::clone(&channel_registry),
        Arc::clone(&mapping_store_port),
        Arc::clone(&whatsapp_transport),
        Arc::clone(&signal_transport),
        media_router,
        RetryConfig::default(),
    ));

    let message_service = Arc::new(MessageService::new(
        Arc::clone(&bridge),
        Arc::clone(&mapping_store_port),
        MessageServiceConfig { relay_self_outbound: false, default_session: Some(SESSION.to_string()) },
    ));

    let mut config = AppConfig::default();
    config.server = ServerConfig::default();
    config.whatsapp = WhatsAppConfig { webhook_secret: None, default_session: SESSION.to_string(), ..config.whatsapp };
    config.signal =
        SignalConfig { webhook_secret: SecretString::from(SIGNAL_SECRET.to_string()), ..config.signal };

    let metrics = Arc::new(MetricsCollector::new());
    let rate_limiter_layer = RateLimiterLayer::new(&rate_limiter_config);
    let rate_limiter_state = rate_limiter_layer.state();

    let state = AppState {
        mapping_store: mapping_store_port,
        channel_registry,
        whatsapp_transport,
        signal_transport,
        bridge,
        message_service,
        config: ReloadableConfig::new(config),
        metrics,
        rate_limiter: rate_limiter_state,
    };

    let app = create_router(state, max_body_bytes, rate_limiter_layer);

    Harness { app, whatsapp, signal, mapping_store }
}

fn signal_signature(body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(SIGNAL_SECRET.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

async fn post(app: &axum::Router, path: &str, body: Value, headers: &[(&str, String)]) -> (StatusCode, Value) {
    let bytes = serde_json::to_vec(&body).unwrap();
    let mut builder = Request::builder().method("POST").uri(path).header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, value);
    }
    let request = builder.body(Body::from(bytes)).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body_bytes.is_empty() { Value::Null } else { serde_json::from_slice(&body_bytes).unwrap_or(Value::Null) };
    (status, json)
}

/// S1 — Text WA→Signal.
#[tokio::test]
async fn s1_whatsapp_text_relays_to_signal() {
    let h = build_harness();

    let payload = serde_json::json!({
        "session": SESSION,
        "event": "message",
        "payload": {
            "id": "wamid.T1",
            "timestamp": 1_700_000_000,
            "from": "1234567890@c.us",
            "fromMe": false,
            "body": "hi",
            "hasMedia": false,
        }
    });

    let (status, _) = post(&h.app, "/webhook/whatsapp", payload, &[]).await;

    assert_eq!(status, StatusCode::OK);
    let sent = h.signal.sent_texts();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, DESTINATION);
    assert_eq!(sent[0].1, "hi");

    let mapping = h.mapping_store.get_by_whatsapp_id("wamid.T1").await.unwrap().expect("mapping saved");
    assert_eq!(mapping.whatsapp_msg_id, "wamid.T1");
    assert_eq!(mapping.session_name.as_str(), SESSION);
}

/// S2 — Signal→WA reply with quote.
#[tokio::test]
async fn s2_signal_reply_with_quote_relays_to_whatsapp() {
    let h = build_harness();

    // Seed the mapping S2 depends on directly in the store.
    let group_chat = domain::ChatId::group("120363028123456789").unwrap();
    let seed = domain::MessageMapping::new(
        group_chat,
        "wamid.Q1".to_string(),
        "1700000000000".to_string(),
        1_700_000_000,
        SessionName::new(SESSION).unwrap(),
        domain::MediaCategory::Text,
    )
    .unwrap();
    h.mapping_store.save(&seed).await.unwrap();

    let payload = serde_json::json!({
        "account": DESTINATION,
        "envelope": {
            "source": "group.120363028123456789",
            "timestamp": 1_700_000_500,
            "dataMessage": {
                "timestamp": 1_700_000_500,
                "message": "thread reply",
                "quote": { "id": 1_700_000_000_000i64, "author": DESTINATION },
            }
        }
    });
    let bytes = serde_json::to_vec(&payload).unwrap();
    let sig = signal_signature(&bytes);

    let (status, _) = post(
        &h.app,
        "/webhook/signal",
        payload,
        &[
            ("x-webhook-hmac", sig),
            ("x-webhook-timestamp", chrono::Utc::now().timestamp().to_string()),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let sent = h.whatsapp.sent_texts();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, "thread reply");
}

/// S3 — Signal quote targets a non-group mapping: chat-kind mismatch.
#[tokio::test]
async fn s3_quote_chat_kind_mismatch_rejected() {
    let h = build_harness();

    let direct_chat = domain::ChatId::direct("1234567890").unwrap();
    let seed = domain::MessageMapping::new(
        direct_chat,
        "wamid.Q1".to_string(),
        "1700000000000".to_string(),
        1_700_000_000,
        SessionName::new(SESSION).unwrap(),
        domain::MediaCategory::Text,
    )
    .unwrap();
    h.mapping_store.save(&seed).await.unwrap();

    let payload = serde_json::json!({
        "account": DESTINATION,
        "envelope": {
            "source": "group.120363028123456789",
            "timestamp": 1_700_000_500,
            "dataMessage": {
                "timestamp": 1_700_000_500,
                "message": "thread reply",
                "quote": { "id": 1_700_000_000_000i64, "author": DESTINATION },
            }
        }
    });
    let bytes = serde_json::to_vec(&payload).unwrap();
    let sig = signal_signature(&bytes);

    let (status, _) = post(
        &h.app,
        "/webhook/signal",
        payload,
        &[
            ("x-webhook-hmac", sig),
            ("x-webhook-timestamp", chrono::Utc::now().timestamp().to_string()),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(h.whatsapp.sent_texts().is_empty());
}

/// S6 — Reaction round-trip after a prior text relay.
#[tokio::test]
async fn s6_reaction_round_trip() {
    let h = build_harness();

    let text_payload = serde_json::json!({
        "session": SESSION,
        "event": "message",
        "payload": {
            "id": "wamid.T1",
            "timestamp": 1_700_000_000,
            "from": "1234567890@c.us",
            "fromMe": false,
            "body": "hi",
            "hasMedia": false,
        }
    });
    let (status, _) = post(&h.app, "/webhook/whatsapp", text_payload, &[]).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(h.signal.sent_texts().len(), 1);
    // The Bridge stamped the mapping with the Signal-side send timestamp
    // returned by `RecordingTransport::send_text`; pull it back out so the
    // reaction payload below references the same message.
    let mapping = h.mapping_store.get_by_whatsapp_id("wamid.T1").await.unwrap().unwrap();
    let signal_sent_timestamp = mapping.signal_timestamp;

    let reaction_payload = serde_json::json!({
        "account": DESTINATION,
        "envelope": {
            "source": DESTINATION,
            "timestamp": 1_700_000_600,
            "dataMessage": {
                "timestamp": 1_700_000_600,
                "reaction": {
                    "emoji": "\u{1F44D}",
                    "targetAuthor": DESTINATION,
                    "targetSentTimestamp": signal_sent_timestamp,
                    "isRemove": false,
                }
            }
        }
    });
    let bytes = serde_json::to_vec(&reaction_payload).unwrap();
    let sig = signal_signature(&bytes);

    let (status, _) = post(
        &h.app,
        "/webhook/signal",
        reaction_payload,
        &[
            ("x-webhook-hmac", sig),
            ("x-webhook-timestamp", chrono::Utc::now().timestamp().to_string()),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let reactions = h.whatsapp.reactions();
    assert_eq!(reactions.len(), 1);
    assert_eq!(reactions[0].0, "wamid.T1");
    assert_eq!(reactions[0].1, "\u{1F44D}");
}

/// S4 — a caller exceeding the per-window request limit is rejected.
#[tokio::test]
async fn s4_rate_limit_rejects_excess_requests() {
    let h = build_harness_with(
        RateLimiterConfig { enabled: true, limit: 1, window: std::time::Duration::from_secs(60) },
        10 * 1024 * 1024,
    );

    let payload = |id: &str| {
        serde_json::json!({
            "session": SESSION,
            "event": "message",
            "payload": {
                "id": id,
                "timestamp": 1_700_000_000,
                "from": "1234567890@c.us",
                "fromMe": false,
                "body": "hi",
                "hasMedia": false,
            }
        })
    };

    let (first_status, _) = post(&h.app, "/webhook/whatsapp", payload("wamid.T1"), &[]).await;
    assert_eq!(first_status, StatusCode::OK);

    let (second_status, _) = post(&h.app, "/webhook/whatsapp", payload("wamid.T2"), &[]).await;
    assert_eq!(second_status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(h.signal.sent_texts().len(), 1);
}

/// S5 — a webhook body over the configured size cap is rejected before it
/// ever reaches the handler.
#[tokio::test]
async fn s5_oversized_webhook_body_rejected() {
    let h = build_harness_with(
        RateLimiterConfig { enabled: false, limit: 1000, window: std::time::Duration::from_secs(60) },
        1024,
    );

    let oversized_body = serde_json::json!({
        "session": SESSION,
        "event": "message",
        "payload": {
            "id": "wamid.T1",
            "timestamp": 1_700_000_000,
            "from": "1234567890@c.us",
            "fromMe": false,
            "body": "x".repeat(4096),
            "hasMedia": false,
        }
    });

    let (status, _) = post(&h.app, "/webhook/whatsapp", oversized_body, &[]).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(h.signal.sent_texts().is_empty());
}

/// Signal webhook signature verification is mandatory: no header, no relay.
#[tokio::test]
async fn signal_webhook_without_signature_is_rejected() {
    let h = build_harness();

    let payload = serde_json::json!({
        "account": DESTINATION,
        "envelope": { "source": DESTINATION, "timestamp": 1, "dataMessage": { "timestamp": 1, "message": "hi" } }
    });

    let (status, _) = post(&h.app, "/webhook/signal", payload, &[]).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(h.whatsapp.sent_texts().is_empty());
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let h = build_harness();
    let (status, body) = post_get(&h.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn readiness_endpoint_reports_all_dependencies_healthy() {
    let h = build_harness();
    let (status, body) = post_get(&h.app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
}

#[tokio::test]
async fn metrics_endpoint_returns_counters() {
    let h = build_harness();
    let (status, body) = post_get(&h.app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["requests"].is_object());
    assert!(body["relay"].is_object());
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let h = build_harness();
    let (status, _) = post_get(&h.app, "/unknown/path").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

async fn post_get(app: &axum::Router, path: &str) -> (StatusCode, Value) {
    let request = Request::builder().method("GET").uri(path).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body_bytes.is_empty() { Value::Null } else { serde_json::from_slice(&body_bytes).unwrap_or(Value::Null) };
    (status, json)
}
