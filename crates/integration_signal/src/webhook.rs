//! Signal webhook payload
//!
//! Verifies the mandatory HMAC signature then translates the envelope into
//! a platform-neutral [`RawInboundEvent`]. Attachments are not fetched
//! here; the caller inspects `envelope.data_message.attachments` and calls
//! [`crate::client::SignalClient::download_attachment`] before attaching
//! media to the classified event.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use application::events::{ReactionInfo, RawInboundEvent};
use domain::MessengerSource;

use crate::types::SignalWebhookPayload;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-webhook-hmac";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("unrecognised or empty envelope: {0}")]
    UnknownEvent(String),
}

/// Verify a webhook body's HMAC-SHA256 signature (hex digest, no prefix)
/// against the configured shared secret. Unlike the WhatsApp side, Signal
/// webhooks must always carry a valid signature.
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

impl SignalWebhookPayload {
    pub fn into_event(self) -> Result<RawInboundEvent, WebhookError> {
        let Self { account, envelope } = self;

        if let Some(sent) = envelope.sync_message.as_ref().and_then(|s| s.sent_message.clone()) {
            let destination = sent.destination.clone().unwrap_or_else(|| envelope.source.clone());
            let is_group = destination.starts_with("group.");
            return Ok(RawInboundEvent::message(
                MessengerSource::Signal,
                account,
                destination,
                is_group,
                sent.timestamp.to_string(),
                sent.timestamp,
                true,
                sent.message,
            ));
        }

        let Some(data) = envelope.data_message else {
            return Err(WebhookError::UnknownEvent("envelope carries neither dataMessage nor syncMessage".to_string()));
        };

        let is_group = envelope.source.starts_with("group.");
        let message_id = data.timestamp.to_string();
        let base = RawInboundEvent::message(
            MessengerSource::Signal,
            account,
            envelope.source,
            is_group,
            message_id,
            data.timestamp,
            false,
            data.message,
        );
        let base = match &data.quote {
            Some(quote) => base.with_quoted(quote.id.to_string()),
            None => base,
        };

        let event = if data.remote_delete.is_some() {
            base.with_deletion()
        } else if let Some(reaction) = data.reaction {
            base.with_reaction(ReactionInfo {
                target_message_id: reaction.target_sent_timestamp.to_string(),
                emoji: reaction.emoji,
                is_remove: reaction.is_remove,
            })
        } else {
            base
        };

        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json(extra: &str) -> String {
        format!(
            r#"{{"account":"+1111111111","envelope":{{"source":"+2222222222","timestamp":1700000000,"dataMessage":{{"timestamp":1700000000,"message":"hi"{extra}}}}}}}"#
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
    fn parses_plain_direct_message() {
        let json = sample_json("");
        let payload: SignalWebhookPayload = serde_json::from_str(&json).unwrap();
        let event = payload.into_event().unwrap();
        assert_eq!(event.message_id, "1700000000");
        assert_eq!(event.body.as_deref(), Some("hi"));
        assert!(!event.is_group);
        assert_eq!(event.session_or_destination, "+1111111111");
    }

    #[test]
    fn parses_group_message() {
        let json = r#"{"account":"+1111111111","envelope":{"source":"group.120363028123456789","timestamp":1700000001,"dataMessage":{"timestamp":1700000001,"message":"hi group"}}}"#;
        let payload: SignalWebhookPayload = serde_json::from_str(json).unwrap();
        let event = payload.into_event().unwrap();
        assert!(event.is_group);
    }

    #[test]
    fn parses_quoted_reply() {
        let json = sample_json(r#","quote":{"id":1700000000000,"author":"+1111111111"}"#);
        let payload: SignalWebhookPayload = serde_json::from_str(&json).unwrap();
        let event = payload.into_event().unwrap();
        assert_eq!(event.quoted_message_id.as_deref(), Some("1700000000000"));
    }

    #[test]
    fn parses_reaction() {
        let json = sample_json(
            r#","reaction":{"emoji":"👍","targetAuthor":"+1111111111","targetSentTimestamp":1699999999,"isRemove":false}"#,
        );
        let payload: SignalWebhookPayload = serde_json::from_str(&json).unwrap();
        let event = payload.into_event().unwrap();
        let reaction = event.reaction.unwrap();
        assert_eq!(reaction.target_message_id, "1699999999");
        assert!(!reaction.is_remove);
    }

    #[test]
    fn parses_remote_delete_as_deletion() {
        let json = sample_json(r#","remoteDelete":{"timestamp":1700000000}"#);
        let payload: SignalWebhookPayload = serde_json::from_str(&json).unwrap();
        let event = payload.into_event().unwrap();
        assert!(event.is_deletion);
    }

    #[test]
    fn sync_sent_message_is_self_outbound() {
        let json = r#"{"account":"+1111111111","envelope":{"source":"+1111111111","timestamp":1700000003,"syncMessage":{"sentMessage":{"destination":"+2222222222","message":"outbound","timestamp":1700000003}}}}"#;
        let payload: SignalWebhookPayload = serde_json::from_str(json).unwrap();
        let event = payload.into_event().unwrap();
        assert!(event.from_me);
        assert_eq!(event.chat_id_raw, "+2222222222");
    }

    #[test]
    fn envelope_without_data_or_sync_is_unknown() {
        let json = r#"{"account":"+1111111111","envelope":{"source":"+2222222222","timestamp":1700000000}}"#;
        let payload: SignalWebhookPayload = serde_json::from_str(json).unwrap();
        assert!(matches!(payload.into_event(), Err(WebhookError::UnknownEvent(_))));
    }
}
