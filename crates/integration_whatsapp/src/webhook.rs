//! WhatsApp gateway webhook payload
//!
//! Parses the gateway's webhook body and verifies its HMAC signature, then
//! translates it into a platform-neutral [`RawInboundEvent`]. Media is not
//! downloaded here; the caller fetches it from `payload.media.url` via
//! [`crate::client::WhatsAppClient::download_media`] once the event has
//! been classified and is known to need it.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use application::events::RawInboundEvent;
use domain::{DeliveryStatus, MessengerSource};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook's HMAC signature.
pub const SIGNATURE_HEADER: &str = "x-webhook-hmac";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("unrecognised event type: {0}")]
    UnknownEvent(String),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Verify a webhook body's HMAC-SHA256 signature against the configured
/// shared secret. `signature` is the raw hex digest (no `sha256=` prefix;
/// the gateway sends the header value as-is).
#[must_use]
pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);

    let Ok(expected) = hex::decode(signature) else {
        return false;
    };

    mac.verify_slice(&expected).is_ok()
}

/// The gateway's webhook envelope.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub session: String,
    pub event: String,
    pub payload: EventPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub id: String,
    pub timestamp: i64,
    pub from: String,
    #[serde(default)]
    pub from_me: bool,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub has_media: bool,
    #[serde(default)]
    pub media: Option<MediaRef>,
    #[serde(default)]
    pub reaction: Option<ReactionRef>,
    #[serde(default)]
    pub edited_message_id: Option<String>,
    #[serde(default)]
    pub ack: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct MediaRef {
    pub url: String,
    pub mimetype: String,
    pub filename: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRef {
    pub text: String,
    pub message_id: String,
}

/// Gateway message-ack status codes, mapped to [`DeliveryStatus`].
///
/// The gateway follows wwebjs's numbering: -1 error, 0 pending, 1 sent
/// (server ack), 2 delivered, 3 read, 4 played (voice notes; treated as read).
fn ack_to_delivery_status(ack: i32) -> Option<DeliveryStatus> {
    match ack {
        -1 => Some(DeliveryStatus::Failed),
        0 | 1 => Some(DeliveryStatus::Pending),
        2 => Some(DeliveryStatus::Delivered),
        3 | 4 => Some(DeliveryStatus::Read),
        _ => None,
    }
}

impl WebhookPayload {
    /// Translate this webhook into a platform-neutral inbound event.
    ///
    /// Media, if present, is carried only as a reference (`url` extraction
    /// happens separately); callers that need the attachment bytes fetch
    /// them from `self.payload.media` before discarding the raw payload.
    pub fn into_event(self) -> Result<RawInboundEvent, WebhookError> {
        let is_group = self.payload.from.ends_with("@g.us") || self.payload.from.starts_with("group.");
        let chat_id_raw = self
            .payload
            .from
            .strip_suffix("@c.us")
            .or_else(|| self.payload.from.strip_suffix("@g.us"))
            .unwrap_or(&self.payload.from)
            .to_string();
        let base = RawInboundEvent::message(
            MessengerSource::WhatsApp,
            self.session,
            chat_id_raw,
            is_group,
            self.payload.id.clone(),
            self.payload.timestamp,
            self.payload.from_me,
            self.payload.body.clone(),
        );

        let event = match self.event.as_str() {
            "message" => base,
            "message.reaction" => {
                let reaction = self.payload.reaction.ok_or_else(|| {
                    WebhookError::Malformed("message.reaction without reaction field".to_string())
                })?;
                base.with_reaction(application::events::ReactionInfo {
                    target_message_id: reaction.message_id,
                    emoji: reaction.text.clone(),
                    is_remove: reaction.text.is_empty(),
                })
            },
            "message.edited" => {
                let edited_id = self.payload.edited_message_id.ok_or_else(|| {
                    WebhookError::Malformed("message.edited without editedMessageId".to_string())
                })?;
                base.with_edit(edited_id)
            },
            "message.revoke" => base.with_deletion(),
            "message.ack" => {
                let ack = self
                    .payload
                    .ack
                    .ok_or_else(|| WebhookError::Malformed("message.ack without ack field".to_string()))?;
                let status = ack_to_delivery_status(ack)
                    .ok_or_else(|| WebhookError::Malformed(format!("unknown ack code {ack}")))?;
                base.with_ack(status)
            },
            other => return Err(WebhookError::UnknownEvent(other.to_string())),
        };

        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json(event: &str, extra: &str) -> String {
        format!(
            r#"{{"session":"personal","event":"{event}","payload":{{"id":"wamid.T1","timestamp":1700000000,"from":"1234567890@c.us","fromMe":false,"body":"hi","hasMedia":false{extra}}}}}"#
        )
    }

    #[test]
    fn signature_roundtrips() {
        let payload = b"body-bytes";
        let secret = "shh";
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload);
        let sig = hex::encode(mac.finalize().into_bytes());
        assert!(verify_signature(payload, &sig, secret));
    }

    #[test]
    fn signature_rejects_wrong_secret() {
        let payload = b"body-bytes";
        let mut mac = HmacSha256::new_from_slice(b"right").unwrap();
        mac.update(payload);
        let sig = hex::encode(mac.finalize().into_bytes());
        assert!(!verify_signature(payload, &sig, "wrong"));
    }

    #[test]
    fn signature_rejects_malformed_hex() {
        assert!(!verify_signature(b"x", "not-hex!", "secret"));
    }

    #[test]
    fn parses_plain_message() {
        let json = sample_json("message", "");
        let payload: WebhookPayload = serde_json::from_str(&json).unwrap();
        let event = payload.into_event().unwrap();
        assert_eq!(event.message_id, "wamid.T1");
        assert_eq!(event.body.as_deref(), Some("hi"));
        assert!(!event.is_group);
    }

    #[test]
    fn parses_group_chat() {
        let json = r#"{"session":"personal","event":"message","payload":{"id":"m1","timestamp":1,"from":"120363028123456789@g.us","fromMe":false,"body":"hi","hasMedia":false}}"#;
        let payload: WebhookPayload = serde_json::from_str(json).unwrap();
        let event = payload.into_event().unwrap();
        assert!(event.is_group);
        assert_eq!(event.chat_id_raw, "120363028123456789");
    }

    #[test]
    fn chat_id_raw_strips_direct_suffix() {
        let json = sample_json("message", "");
        let payload: WebhookPayload = serde_json::from_str(&json).unwrap();
        let event = payload.into_event().unwrap();
        assert_eq!(event.chat_id_raw, "1234567890");
    }

    #[test]
    fn parses_reaction() {
        let json = sample_json(
            "message.reaction",
            r#","reaction":{"text":"👍","messageId":"wamid.T0"}"#,
        );
        let payload: WebhookPayload = serde_json::from_str(&json).unwrap();
        let event = payload.into_event().unwrap();
        let reaction = event.reaction.unwrap();
        assert_eq!(reaction.target_message_id, "wamid.T0");
        assert_eq!(reaction.emoji, "👍");
        assert!(!reaction.is_remove);
    }

    #[test]
    fn parses_edit() {
        let json = sample_json("message.edited", ",\"editedMessageId\":\"wamid.T0\"");
        let payload: WebhookPayload = serde_json::from_str(&json).unwrap();
        let event = payload.into_event().unwrap();
        assert_eq!(event.edited_message_id.as_deref(), Some("wamid.T0"));
    }

    #[test]
    fn parses_revoke_as_deletion() {
        let json = sample_json("message.revoke", "");
        let payload: WebhookPayload = serde_json::from_str(&json).unwrap();
        let event = payload.into_event().unwrap();
        assert!(event.is_deletion);
    }

    #[test]
    fn parses_ack_delivered() {
        let json = sample_json("message.ack", r#","ack":2"#);
        let payload: WebhookPayload = serde_json::from_str(&json).unwrap();
        let event = payload.into_event().unwrap();
        assert_eq!(event.ack_status, Some(DeliveryStatus::Delivered));
    }

    #[test]
    fn unknown_event_rejected() {
        let json = sample_json("message.unknown", "");
        let payload: WebhookPayload = serde_json::from_str(&json).unwrap();
        assert!(matches!(payload.into_event(), Err(WebhookError::UnknownEvent(_))));
    }

    #[test]
    fn reaction_without_field_is_malformed() {
        let json = sample_json("message.reaction", "");
        let payload: WebhookPayload = serde_json::from_str(&json).unwrap();
        assert!(matches!(payload.into_event(), Err(WebhookError::Malformed(_))));
    }
}
