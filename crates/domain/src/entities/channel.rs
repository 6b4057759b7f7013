//! Channel — a configured (WhatsApp session, Signal destination) pair
//!
//! Channels are configuration, not persisted state; they are the unit of
//! multiplexing the Channel Registry is built from.

use serde::{Deserialize, Serialize};

use crate::{errors::DomainError, value_objects::SessionName};

/// One configured pairing between a WhatsApp session and the Signal
/// destination (intermediary phone number) it relays through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub whatsapp_session_name: SessionName,
    pub signal_destination_phone_number: String,
}

impl Channel {
    /// Construct a channel, rejecting an empty destination number.
    pub fn new(
        whatsapp_session_name: SessionName,
        signal_destination_phone_number: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let destination = signal_destination_phone_number.into();
        if destination.trim().is_empty() {
            return Err(DomainError::InvalidChannel(
                "signal destination must not be empty".to_string(),
            ));
        }
        Ok(Self {
            whatsapp_session_name,
            signal_destination_phone_number: destination,
        })
    }
}
