//! Integration tests for the Signal REST bridge client against a mocked
//! HTTP server, and for webhook payload parsing.

use application::ports::{SendTarget, TransportClient};
use domain::ChatId;
use integration_signal::{SignalClient, SignalClientConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str) -> SignalClientConfig {
    SignalClientConfig {
        rpc_url: base_url.to_string(),
        intermediary_phone_number: "+1111111111".to_string(),
        device_name: "whatsignal".to_string(),
        http_timeout_sec: 5,
        attachment_download_timeout_sec: 5,
    }
}

#[tokio::test]
async fn send_text_posts_to_v2_send() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "timestamp": 1_700_000_100_i64,
            "messageId": "1700000100",
        })))
        .mount(&server)
        .await;

    let client = SignalClient::new(test_config(&server.uri())).unwrap();
    let target = SendTarget::new(ChatId::direct("+2222222222").unwrap(), "+1111111111".to_string());
    let sent = client.send_text(&target, "hi").await.unwrap();

    assert_eq!(sent.message_id, "1700000100");
    assert_eq!(sent.timestamp, 1_700_000_100);
}

#[tokio::test]
async fn send_text_with_quote_carries_quote_timestamp() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"timestamp": 1_700_000_200_i64})))
        .mount(&server)
        .await;

    let client = SignalClient::new(test_config(&server.uri())).unwrap();
    let target = SendTarget::new(ChatId::direct("+2222222222").unwrap(), "+1111111111".to_string())
        .with_quoted("1700000000000");
    let sent = client.send_text(&target, "thread reply").await.unwrap();

    assert_eq!(sent.timestamp, 1_700_000_200);
}

#[tokio::test]
async fn send_text_rejects_non_numeric_quote() {
    let server = MockServer::start().await;
    let client = SignalClient::new(test_config(&server.uri())).unwrap();
    let target = SendTarget::new(ChatId::direct("+2222222222").unwrap(), "+1111111111".to_string())
        .with_quoted("not-a-timestamp");
    let err = client.send_text(&target, "hi").await.unwrap_err();
    assert!(matches!(err, application::WhatSignalError::Protocol(_)));
}

#[tokio::test]
async fn send_text_translates_5xx_to_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/send"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    let client = SignalClient::new(test_config(&server.uri())).unwrap();
    let target = SendTarget::new(ChatId::direct("+2222222222").unwrap(), "+1111111111".to_string());
    let err = client.send_text(&target, "hi").await.unwrap_err();

    assert!(matches!(err, application::WhatSignalError::Transport(_)));
}

#[tokio::test]
async fn send_reaction_posts_to_reactions_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/reactions/+1111111111"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = SignalClient::new(test_config(&server.uri())).unwrap();
    let target = SendTarget::new(ChatId::direct("+2222222222").unwrap(), "+1111111111".to_string());
    client.send_reaction(&target, "1700000000000", "\u{1F44D}").await.unwrap();
}

#[tokio::test]
async fn delete_calls_messages_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/messages/+1111111111/1700000000000"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = SignalClient::new(test_config(&server.uri())).unwrap();
    let target = SendTarget::new(ChatId::direct("+2222222222").unwrap(), "+1111111111".to_string());
    client.delete(&target, "1700000000000").await.unwrap();
}

#[tokio::test]
async fn ack_failure_is_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/receipts/+1111111111"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let client = SignalClient::new(test_config(&server.uri())).unwrap();
    let target = SendTarget::new(ChatId::direct("+2222222222").unwrap(), "+1111111111".to_string());
    assert!(client.ack(&target, "1700000000000").await.is_ok());
}

#[tokio::test]
async fn health_check_succeeds_when_bridge_reachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/about"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"versions": ["v1"]})))
        .mount(&server)
        .await;

    let client = SignalClient::new(test_config(&server.uri())).unwrap();
    client.health_check().await.unwrap();
}

#[tokio::test]
async fn receive_parses_envelope_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/receive/+1111111111"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"envelope": {"source": "+2222222222", "timestamp": 1_700_000_000_i64, "dataMessage": {"timestamp": 1_700_000_000_i64, "message": "hi"}}}
        ])))
        .mount(&server)
        .await;

    let client = SignalClient::new(test_config(&server.uri())).unwrap();
    let envelopes = client.receive(0).await.unwrap();
    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0].source, "+2222222222");
}

#[tokio::test]
async fn download_attachment_fetches_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/attachments/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![9, 8, 7]))
        .mount(&server)
        .await;

    let client = SignalClient::new(test_config(&server.uri())).unwrap();
    let bytes = client.download_attachment("abc123").await.unwrap();
    assert_eq!(bytes, vec![9, 8, 7]);
}

#[tokio::test]
async fn list_attachments_returns_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/attachments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(["abc123", "def456"])))
        .mount(&server)
        .await;

    let client = SignalClient::new(test_config(&server.uri())).unwrap();
    let ids = client.list_attachments().await.unwrap();
    assert_eq!(ids, vec!["abc123".to_string(), "def456".to_string()]);
}

mod webhook_tests {
    use integration_signal::SignalWebhookPayload;

    #[test]
    fn s2_signal_reply_with_quote_scenario() {
        let json = r#"{
            "account": "+1111111111",
            "envelope": {
                "source": "group.120363028123456789",
                "timestamp": 1700000000001,
                "dataMessage": {
                    "timestamp": 1700000000001,
                    "message": "thread reply",
                    "quote": {"id": 1700000000000, "author": "+1111111111"}
                }
            }
        }"#;
        let payload: SignalWebhookPayload = serde_json::from_str(json).unwrap();
        let event = payload.into_event().unwrap();
        assert_eq!(event.quoted_message_id.as_deref(), Some("1700000000000"));
        assert!(event.is_group);
        assert_eq!(event.body.as_deref(), Some("thread reply"));
    }

    #[test]
    fn s6_reaction_round_trip_scenario() {
        let json = r#"{
            "account": "+1111111111",
            "envelope": {
                "source": "+2222222222",
                "timestamp": 1700000050,
                "dataMessage": {
                    "timestamp": 1700000050,
                    "reaction": {"emoji": "\u{1F44D}", "targetAuthor": "+1111111111", "targetSentTimestamp": 1700000000, "isRemove": false}
                }
            }
        }"#;
        let payload: SignalWebhookPayload = serde_json::from_str(json).unwrap();
        let event = payload.into_event().unwrap();
        let reaction = event.reaction.unwrap();
        assert_eq!(reaction.target_message_id, "1700000000");
    }
}
