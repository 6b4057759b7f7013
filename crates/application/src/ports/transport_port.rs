//! Shared dynamic-dispatch surface both platform clients implement
//!
//! The Bridge only needs a handful of operations common to both WhatsApp
//! and Signal to relay a message; it never needs session lifecycle or
//! attachment download. This trait is that common subset, letting the
//! Bridge hold a `Box<dyn TransportClient>` per direction instead of
//! matching on a platform enum.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use domain::{ChatId, MediaCategory};

use crate::WhatSignalError;

/// Where an outbound message should land: a platform-neutral chat
/// identifier plus an optional quoted-message id for replies.
#[derive(Debug, Clone)]
pub struct SendTarget {
    pub chat_id: ChatId,
    pub session_or_destination: String,
    pub quoted_message_id: Option<String>,
}

impl SendTarget {
    #[must_use]
    pub const fn new(chat_id: ChatId, session_or_destination: String) -> Self {
        Self {
            chat_id,
            session_or_destination,
            quoted_message_id: None,
        }
    }

    #[must_use]
    pub fn with_quoted(mut self, quoted_message_id: impl Into<String>) -> Self {
        self.quoted_message_id = Some(quoted_message_id.into());
        self
    }
}

/// A media attachment to forward, already fetched into memory.
#[derive(Clone)]
pub struct MediaPayload {
    pub category: MediaCategory,
    pub mime_type: String,
    pub file_name: String,
    pub bytes: bytes::Bytes,
}

impl std::fmt::Debug for MediaPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaPayload")
            .field("category", &self.category)
            .field("mime_type", &self.mime_type)
            .field("file_name", &self.file_name)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

/// Identity assigned by the receiving platform to a message this process
/// just sent, used to persist the new mapping row.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub message_id: String,
    pub timestamp: i64,
}

/// The capability set the Bridge dynamically dispatches over. Both
/// `integration_whatsapp::WhatsAppClient` and `integration_signal::SignalClient`
/// implement this in addition to their own larger, platform-specific APIs.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait TransportClient: Send + Sync {
    /// Send a plain text message, optionally quoting an existing message.
    async fn send_text(&self, target: &SendTarget, body: &str) -> Result<SentMessage, WhatSignalError>;

    /// Send a media attachment, with an optional caption.
    async fn send_media(
        &self,
        target: &SendTarget,
        media: &MediaPayload,
        caption: Option<&str>,
    ) -> Result<SentMessage, WhatSignalError>;

    /// Mirror a reaction (emoji) onto a previously forwarded message.
    async fn send_reaction(
        &self,
        target: &SendTarget,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), WhatSignalError>;

    /// Delete a previously forwarded message.
    async fn delete(&self, target: &SendTarget, message_id: &str) -> Result<(), WhatSignalError>;

    /// Acknowledge receipt/read of an inbound message back to its source
    /// platform, if that platform distinguishes delivered from read.
    async fn ack(&self, target: &SendTarget, message_id: &str) -> Result<(), WhatSignalError>;

    /// Cheap reachability check for the `/health` endpoint.
    async fn health_check(&self) -> Result<(), WhatSignalError>;
}
