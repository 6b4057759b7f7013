//! MessageMapping — the cross-platform correlation record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    errors::DomainError,
    value_objects::{ChatId, DeliveryStatus, MediaCategory, SessionName},
};

/// A persistent correlation between one WhatsApp message id and one Signal
/// message id, plus the chat/session context needed to route replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageMapping {
    pub whatsapp_chat_id: ChatId,
    pub whatsapp_msg_id: String,
    pub signal_msg_id: String,
    pub signal_timestamp: i64,
    pub session_name: SessionName,
    pub media_type: MediaCategory,
    pub delivery_status: DeliveryStatus,
    pub forwarded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MessageMapping {
    /// Construct a new mapping at the moment of a successful relay.
    ///
    /// `delivery_status` starts `pending`; `signal_timestamp` must be
    /// strictly positive per the data-model invariant.
    pub fn new(
        whatsapp_chat_id: ChatId,
        whatsapp_msg_id: impl Into<String>,
        signal_msg_id: impl Into<String>,
        signal_timestamp: i64,
        session_name: SessionName,
        media_type: MediaCategory,
    ) -> Result<Self, DomainError> {
        if signal_timestamp <= 0 {
            return Err(DomainError::ValidationError(
                "signal_timestamp must be > 0".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            whatsapp_chat_id,
            whatsapp_msg_id: whatsapp_msg_id.into(),
            signal_msg_id: signal_msg_id.into(),
            signal_timestamp,
            session_name,
            media_type,
            delivery_status: DeliveryStatus::Pending,
            forwarded_at: now,
            created_at: now,
            updated_at: now,
        })
    }

    /// The composite primary key of this row.
    pub fn primary_key(&self) -> (&str, &str) {
        (&self.whatsapp_msg_id, &self.signal_msg_id)
    }

    /// Apply a delivery-status transition, enforcing the monotonic rule.
    pub fn transition_to(&mut self, next: DeliveryStatus) -> Result<(), DomainError> {
        self.delivery_status.validate_transition(next)?;
        self.delivery_status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MessageMapping {
        MessageMapping::new(
            ChatId::direct("+1234567890").unwrap(),
            "wamid.T1",
            "1700000000000",
            1_700_000_000_000,
            SessionName::new("personal").unwrap(),
            MediaCategory::Text,
        )
        .unwrap()
    }

    #[test]
    fn new_starts_pending() {
        let mapping = sample();
        assert_eq!(mapping.delivery_status, DeliveryStatus::Pending);
    }

    #[test]
    fn rejects_non_positive_timestamp() {
        let err = MessageMapping::new(
            ChatId::direct("+1234567890").unwrap(),
            "wamid.T1",
            "0",
            0,
            SessionName::new("personal").unwrap(),
            MediaCategory::Text,
        );
        assert!(err.is_err());
    }

    #[test]
    fn primary_key_is_whatsapp_and_signal_ids() {
        let mapping = sample();
        assert_eq!(mapping.primary_key(), ("wamid.T1", "1700000000000"));
    }

    #[test]
    fn transition_to_delivered_then_read_succeeds() {
        let mut mapping = sample();
        mapping.transition_to(DeliveryStatus::Delivered).unwrap();
        mapping.transition_to(DeliveryStatus::Read).unwrap();
        assert_eq!(mapping.delivery_status, DeliveryStatus::Read);
    }

    #[test]
    fn transition_backwards_fails_and_leaves_state_unchanged() {
        let mut mapping = sample();
        mapping.transition_to(DeliveryStatus::Read).unwrap();
        let result = mapping.transition_to(DeliveryStatus::Pending);
        assert!(result.is_err());
        assert_eq!(mapping.delivery_status, DeliveryStatus::Read);
    }
}
