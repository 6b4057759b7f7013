//! Platform-neutral inbound event shape
//!
//! Integration crates (`integration_whatsapp`, `integration_signal`)
//! translate their own wire payloads into a [`RawInboundEvent`]; the
//! [`crate::services::message_service::MessageService`] classifies that
//! raw event without ever seeing a wire format.

use domain::MessengerSource;

/// An attachment carried by an inbound event, already fetched into memory
/// by the originating transport client.
#[derive(Debug, Clone)]
pub struct InboundMedia {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: bytes::Bytes,
}

/// A reaction (emoji) applied to a previously-sent message.
#[derive(Debug, Clone)]
pub struct ReactionInfo {
    pub target_message_id: String,
    pub emoji: String,
    pub is_remove: bool,
}

/// A single inbound event from either platform, prior to classification.
///
/// Exactly one of `reaction`, `edited_message_id`, `is_deletion`, or
/// `ack_status` should be set for a non-plain-message event; the
/// [`crate::services::message_service::MessageService`] is the sole
/// consumer responsible for turning this into one classified kind.
#[derive(Debug, Clone)]
pub struct RawInboundEvent {
    /// Which platform this event arrived from.
    pub source: MessengerSource,
    /// WhatsApp session name, or Signal destination ("account") number.
    pub session_or_destination: String,
    /// Raw, not-yet-canonicalised chat/source identifier.
    pub chat_id_raw: String,
    pub is_group: bool,
    pub message_id: String,
    /// Milliseconds since epoch.
    pub timestamp: i64,
    /// True if this event originated from the relay's own account.
    pub from_me: bool,
    pub body: Option<String>,
    pub media: Option<InboundMedia>,
    pub quoted_message_id: Option<String>,
    pub reaction: Option<ReactionInfo>,
    pub edited_message_id: Option<String>,
    pub is_deletion: bool,
    pub ack_status: Option<domain::DeliveryStatus>,
}

impl RawInboundEvent {
    /// Construct the common case: a plain inbound message, with no
    /// reaction/edit/deletion/ack markers set.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn message(
        source: MessengerSource,
        session_or_destination: String,
        chat_id_raw: String,
        is_group: bool,
        message_id: String,
        timestamp: i64,
        from_me: bool,
        body: Option<String>,
    ) -> Self {
        Self {
            source,
            session_or_destination,
            chat_id_raw,
            is_group,
            message_id,
            timestamp,
            from_me,
            body,
            media: None,
            quoted_message_id: None,
            reaction: None,
            edited_message_id: None,
            is_deletion: false,
            ack_status: None,
        }
    }

    #[must_use]
    pub fn with_media(mut self, media: InboundMedia) -> Self {
        self.media = Some(media);
        self
    }

    #[must_use]
    pub fn with_quoted(mut self, quoted_message_id: impl Into<String>) -> Self {
        self.quoted_message_id = Some(quoted_message_id.into());
        self
    }

    #[must_use]
    pub fn with_reaction(mut self, reaction: ReactionInfo) -> Self {
        self.reaction = Some(reaction);
        self
    }

    #[must_use]
    pub fn with_edit(mut self, edited_message_id: impl Into<String>) -> Self {
        self.edited_message_id = Some(edited_message_id.into());
        self
    }

    #[must_use]
    pub fn with_deletion(mut self) -> Self {
        self.is_deletion = true;
        self
    }

    #[must_use]
    pub fn with_ack(mut self, status: domain::DeliveryStatus) -> Self {
        self.ack_status = Some(status);
        self
    }
}
