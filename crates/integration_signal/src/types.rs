//! Wire types for the signal-cli REST bridge
//!
//! Shared by the outbound client ([`crate::client`]) and the webhook
//! payload ([`crate::webhook`]); `Envelope` and its children describe the
//! same shape whether delivered via `receive` polling or pushed to
//! `/webhook/signal`.

use serde::{Deserialize, Serialize};

/// Body of `POST /v2/send`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub message: String,
    pub number: String,
    pub recipients: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub base64_attachments: Vec<Base64Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_mode: Option<TextMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_author: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextMode {
    Normal,
    Styled,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Base64Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: String,
}

/// Response of `POST /v2/send`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub timestamp: i64,
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRequest {
    pub reaction: String,
    pub recipient: String,
    pub target_author: String,
    pub timestamp: i64,
    #[serde(default)]
    pub remove: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRequest {
    pub receipt_type: ReceiptKind,
    pub recipient: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptKind {
    Read,
    Viewed,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteRequest {
    pub recipient: String,
}

/// `/webhook/signal`'s JSON body, and the element type `receive` returns
/// (wrapped in `{envelope: ...}` per item there, without the outer
/// `account` — the account is implied by the URL in that mode).
#[derive(Debug, Clone, Deserialize)]
pub struct SignalWebhookPayload {
    pub account: String,
    pub envelope: Envelope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceivedEnvelope {
    pub envelope: Envelope,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub source: String,
    #[serde(default)]
    pub source_name: Option<String>,
    pub timestamp: i64,
    #[serde(default)]
    pub data_message: Option<DataMessage>,
    #[serde(default)]
    pub sync_message: Option<SyncMessage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataMessage {
    pub timestamp: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub quote: Option<Quote>,
    #[serde(default)]
    pub reaction: Option<Reaction>,
    #[serde(default)]
    pub remote_delete: Option<RemoteDelete>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    #[serde(default)]
    pub filename: Option<String>,
    pub content_type: String,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: i64,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub emoji: String,
    pub target_author: String,
    pub target_sent_timestamp: i64,
    #[serde(default)]
    pub is_remove: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteDelete {
    pub timestamp: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMessage {
    #[serde(default)]
    pub sent_message: Option<SentMessageSync>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessageSync {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_request_skips_absent_optionals() {
        let req = SendRequest {
            message: "hi".to_string(),
            number: "+1111111111".to_string(),
            recipients: vec!["+2222222222".to_string()],
            base64_attachments: Vec::new(),
            text_mode: None,
            quote_timestamp: None,
            quote_author: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("quoteTimestamp"));
        assert!(!json.contains("base64Attachments"));
    }

    #[test]
    fn envelope_with_reaction_parses() {
        let json = r#"{
            "source": "+1111111111",
            "timestamp": 1700000000,
            "dataMessage": {
                "timestamp": 1700000000,
                "reaction": {
                    "emoji": "👍",
                    "targetAuthor": "+1111111111",
                    "targetSentTimestamp": 1699999999,
                    "isRemove": false
                }
            }
        }"#;
        let envelope: Envelope = serde_json::from_str(json).unwrap();
        let reaction = envelope.data_message.unwrap().reaction.unwrap();
        assert_eq!(reaction.emoji, "👍");
        assert!(!reaction.is_remove);
    }

    #[test]
    fn envelope_with_quote_parses() {
        let json = r#"{
            "source": "group.120363028123456789",
            "timestamp": 1700000001,
            "dataMessage": {
                "timestamp": 1700000001,
                "message": "thread reply",
                "quote": {"id": 1700000000000, "author": "+1111111111"}
            }
        }"#;
        let envelope: Envelope = serde_json::from_str(json).unwrap();
        let quote = envelope.data_message.unwrap().quote.unwrap();
        assert_eq!(quote.id, 1700000000000);
    }

    #[test]
    fn envelope_with_sync_sent_message_parses() {
        let json = r#"{
            "source": "+1111111111",
            "timestamp": 1700000002,
            "syncMessage": {
                "sentMessage": {"destination": "+2222222222", "message": "outbound", "timestamp": 1700000002}
            }
        }"#;
        let envelope: Envelope = serde_json::from_str(json).unwrap();
        assert!(envelope.sync_message.unwrap().sent_message.is_some());
    }

    #[test]
    fn webhook_payload_carries_account() {
        let json = r#"{
            "account": "+1111111111",
            "envelope": {"source": "+2222222222", "timestamp": 1700000000}
        }"#;
        let payload: SignalWebhookPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.account, "+1111111111");
    }
}
