//! Ingress handling: classify a raw inbound event and dispatch it

use std::sync::Arc;

use domain::{ChatId, DeliveryStatus, mask_tail};
use tracing::{info, instrument, warn};

use crate::events::RawInboundEvent;
use crate::ports::MappingStorePort;
use crate::services::bridge::Bridge;
use crate::{RequestContext, WhatSignalError};

/// The exactly-one classification a [`RawInboundEvent`] is sorted into.
#[derive(Debug)]
pub enum Classified {
    /// A new message, possibly with media, possibly quoting another.
    TextOrMedia {
        chat_id: ChatId,
        event: RawInboundEvent,
    },
    /// Targets an existing message.
    Reaction {
        chat_id: ChatId,
        event: RawInboundEvent,
    },
    /// References an edited message id.
    Edit {
        chat_id: ChatId,
        event: RawInboundEvent,
    },
    /// A WhatsApp revoke or Signal `remoteDelete`.
    Deletion {
        chat_id: ChatId,
        event: RawInboundEvent,
    },
    /// A delivery-status update; never reaches the Bridge.
    Ack { message_id: String, status: DeliveryStatus },
    /// Originated from the relay's own device.
    SelfOutbound(RawInboundEvent),
}

/// Whether `SelfOutbound` events (from the relay's own device) should be
/// relayed as though they were regular outbound sends.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageServiceConfig {
    pub relay_self_outbound: bool,
    /// WhatsApp session used when an event carries no session name.
    pub default_session: Option<String>,
}

/// Classifies inbound events and dispatches them to the [`Bridge`] or the
/// Mapping Store, as appropriate.
pub struct MessageService {
    bridge: Arc<Bridge>,
    mapping_store: Arc<dyn MappingStorePort>,
    config: MessageServiceConfig,
}

impl MessageService {
    #[must_use]
    pub fn new(
        bridge: Arc<Bridge>,
        mapping_store: Arc<dyn MappingStorePort>,
        config: MessageServiceConfig,
    ) -> Self {
        Self {
            bridge,
            mapping_store,
            config,
        }
    }

    /// Classify a raw event into exactly one [`Classified`] variant.
    ///
    /// Applies session defaulting and chat-id canonicalisation before
    /// classification, so every branch downstream sees an already-resolved
    /// [`ChatId`].
    ///
    /// # Errors
    ///
    /// Returns [`WhatSignalError::Domain`] if the chat identifier cannot be
    /// parsed or canonicalised.
    pub fn classify(&self, mut event: RawInboundEvent) -> Result<Classified, WhatSignalError> {
        if event.session_or_destination.is_empty() {
            if let Some(default_session) = &self.config.default_session {
                event.session_or_destination = default_session.clone();
            }
        }

        if event.from_me && !self.config.relay_self_outbound {
            return Ok(Classified::SelfOutbound(event));
        }

        let chat_id = canonicalise_chat_id(&event)?;

        if let Some(status) = event.ack_status {
            return Ok(Classified::Ack {
                message_id: event.message_id,
                status,
            });
        }

        if event.reaction.is_some() {
            return Ok(Classified::Reaction { chat_id, event });
        }

        if event.edited_message_id.is_some() {
            return Ok(Classified::Edit { chat_id, event });
        }

        if event.is_deletion {
            return Ok(Classified::Deletion { chat_id, event });
        }

        Ok(Classified::TextOrMedia { chat_id, event })
    }

    /// Classify then dispatch: `Ack` updates the Mapping Store directly;
    /// every other non-`SelfOutbound` kind is handed to the Bridge.
    #[instrument(skip(self, event, ctx), fields(request_id = %ctx.request_id()))]
    pub async fn handle(
        &self,
        event: RawInboundEvent,
        ctx: &RequestContext,
    ) -> Result<(), WhatSignalError> {
        match self.classify(event)? {
            Classified::Ack { message_id, status } => {
                self.mapping_store
                    .update_delivery_status(&message_id, status)
                    .await
            }
            Classified::SelfOutbound(event) => {
                info!(message_id = %mask_tail(&event.message_id, 4), "dropping self-outbound event");
                Ok(())
            }
            classified @ (Classified::TextOrMedia { .. }
            | Classified::Reaction { .. }
            | Classified::Edit { .. }
            | Classified::Deletion { .. }) => {
                if let Err(err) = self.bridge.relay(classified, ctx).await {
                    warn!(error = %err, "relay failed");
                    return Err(err);
                }
                Ok(())
            }
        }
    }
}

/// Canonicalise the raw chat identifier per platform: direct chats become
/// `<e164>@c.us`, groups `<digits>@g.us`; a Signal source prefixed with
/// `group.` maps to the same `@g.us` form. Both platform adapters strip
/// any wire-format suffix before this point, so `chat_id_raw` is always
/// bare digits (with an optional leading `+`) here.
fn canonicalise_chat_id(event: &RawInboundEvent) -> Result<ChatId, WhatSignalError> {
    use domain::MessengerSource;

    let chat_id = match event.source {
        MessengerSource::Signal => ChatId::from_signal_source(&event.chat_id_raw)?,
        MessengerSource::WhatsApp if event.is_group => ChatId::group(&event.chat_id_raw)?,
        MessengerSource::WhatsApp => ChatId::direct(event.chat_id_raw.clone())?,
    };
    Ok(chat_id)
}
