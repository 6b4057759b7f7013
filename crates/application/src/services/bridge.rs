//! The Bridge: the one place that crosses a platform boundary

use std::sync::Arc;

use domain::{ChatId, MediaCategory, MediaRouter, MessageMapping, MessengerSource, SessionName};
use tracing::{instrument, warn};

use crate::channel_registry::ChannelRegistry;
use crate::events::RawInboundEvent;
use crate::ports::{MappingStorePort, MediaPayload, SendTarget, TransportClient};
use crate::retry::{with_retry, RetryConfig};
use crate::services::message_service::Classified;
use crate::{RequestContext, WhatSignalError};

/// Orchestrates an outbound relay across the WhatsApp/Signal boundary.
pub struct Bridge {
    channel_registry: Arc<ChannelRegistry>,
    mapping_store: Arc<dyn MappingStorePort>,
    whatsapp_transport: Arc<dyn TransportClient>,
    signal_transport: Arc<dyn TransportClient>,
    media_router: Arc<MediaRouter>,
    retry_config: RetryConfig,
}

impl Bridge {
    #[must_use]
    pub fn new(
        channel_registry: Arc<ChannelRegistry>,
        mapping_store: Arc<dyn MappingStorePort>,
        whatsapp_transport: Arc<dyn TransportClient>,
        signal_transport: Arc<dyn TransportClient>,
        media_router: Arc<MediaRouter>,
        retry_config: RetryConfig,
    ) -> Self {
        Self {
            channel_registry,
            mapping_store,
            whatsapp_transport,
            signal_transport,
            media_router,
            retry_config,
        }
    }

    /// Relay a classified event across to the opposite platform.
    ///
    /// Steps, per the relay contract: identify target chat, resolve any
    /// quoted reply, materialise media within its size cap, send with
    /// bounded retry, record the new mapping, then best-effort ack the
    /// source.
    ///
    /// # Errors
    ///
    /// Returns [`WhatSignalError::ChannelNotFound`] if no channel is
    /// configured for the event's session/destination,
    /// [`WhatSignalError::MappingNotFound`] if a quote references an
    /// unknown mapping, [`WhatSignalError::ChatKindMismatch`] if a reply's
    /// resolved chat kind disagrees with the source, or
    /// [`WhatSignalError::MediaTooLarge`] if an attachment exceeds its
    /// category's configured cap. Terminal transport failures (4xx) and
    /// retry-exhausted transport failures propagate as-is.
    #[instrument(skip(self, classified, ctx), fields(request_id = %ctx.request_id()))]
    pub async fn relay(&self, classified: Classified, ctx: &RequestContext) -> Result<(), WhatSignalError> {
        match classified {
            Classified::TextOrMedia { chat_id, event } => self.relay_text_or_media(chat_id, event, ctx).await,
            Classified::Reaction { chat_id, event } => self.relay_reaction(chat_id, event).await,
            Classified::Edit { chat_id, event } => self.relay_edit(chat_id, event, ctx).await,
            Classified::Deletion { chat_id, event } => self.relay_deletion(chat_id, event).await,
            Classified::Ack { .. } | Classified::SelfOutbound(_) => Ok(()),
        }
    }

    async fn relay_text_or_media(
        &self,
        source_chat_id: ChatId,
        event: RawInboundEvent,
        ctx: &RequestContext,
    ) -> Result<(), WhatSignalError> {
        let (target_session_or_destination, source_transport, target_transport) =
            self.resolve_direction(&event)?;

        let mut target = SendTarget::new(source_chat_id.clone(), target_session_or_destination.clone());
        if let Some(quoted) = &event.quoted_message_id {
            target = target.with_quoted(self.resolve_reply_target(&event, quoted, &source_chat_id).await?);
        }

        let sent = if let Some(media) = &event.media {
            let category = self.media_router.classify(&media.file_name);
            if self.media_router.exceeds_limit(category, media.bytes.len() as u64) {
                return Err(WhatSignalError::MediaTooLarge(media.file_name.clone()));
            }
            let payload = MediaPayload {
                category,
                mime_type: media.mime_type.clone(),
                file_name: media.file_name.clone(),
                bytes: media.bytes.clone(),
            };
            let body = event.body.clone().unwrap_or_default();
            let target = &target;
            with_retry(&self.retry_config, || {
                target_transport.send_media(target, &payload, Some(&body))
            })
            .await
            .into_result()?
        } else {
            let body = event.body.clone().unwrap_or_default();
            let target = &target;
            with_retry(&self.retry_config, || target_transport.send_text(target, &body))
                .await
                .into_result()?
        };

        let media_type = event
            .media
            .as_ref()
            .map_or(MediaCategory::Text, |m| self.media_router.classify(&m.file_name));

        let wa_session_name = match event.source {
            MessengerSource::WhatsApp => event.session_or_destination.clone(),
            MessengerSource::Signal => target_session_or_destination.clone(),
        };
        let mapping = build_mapping(
            &event,
            &wa_session_name,
            &source_chat_id,
            sent.message_id,
            sent.timestamp,
            media_type,
        )?;
        self.mapping_store.save(&mapping).await?;

        if matches!(event.source, MessengerSource::WhatsApp) {
            if let Err(err) = source_transport.ack(&target, &event.message_id).await {
                warn!(error = %err, request_id = %ctx.request_id(), "best-effort source ack failed");
            }
        }

        Ok(())
    }

    async fn relay_reaction(&self, chat_id: ChatId, event: RawInboundEvent) -> Result<(), WhatSignalError> {
        let reaction = event
            .reaction
            .as_ref()
            .ok_or_else(|| WhatSignalError::Internal("reaction event missing reaction payload".to_string()))?;
        let (target_session_or_destination, _source_transport, target_transport) =
            self.resolve_direction(&event)?;
        let mapping = self
            .lookup_mapping(&event.source, &reaction.target_message_id)
            .await?
            .ok_or_else(|| WhatSignalError::MappingNotFound(reaction.target_message_id.clone()))?;

        let target = SendTarget::new(chat_id, target_session_or_destination);
        let emoji = if reaction.is_remove { "" } else { &reaction.emoji };
        target_transport
            .send_reaction(&target, opposite_message_id(&event.source, &mapping), emoji)
            .await
    }

    async fn relay_edit(
        &self,
        chat_id: ChatId,
        event: RawInboundEvent,
        _ctx: &RequestContext,
    ) -> Result<(), WhatSignalError> {
        let edited_id = event
            .edited_message_id
            .clone()
            .ok_or_else(|| WhatSignalError::Internal("edit event missing edited_message_id".to_string()))?;
        let (target_session_or_destination, _source_transport, target_transport) =
            self.resolve_direction(&event)?;
        let mapping = self
            .lookup_mapping(&event.source, &edited_id)
            .await?
            .ok_or_else(|| WhatSignalError::MappingNotFound(edited_id))?;

        let target = SendTarget::new(chat_id, target_session_or_destination);
        let body = event.body.clone().unwrap_or_default();
        target_transport.send_text(&target, &body).await?;
        self.mapping_store
            .update_delivery_status(&mapping.whatsapp_msg_id, mapping.delivery_status)
            .await
    }

    async fn relay_deletion(&self, chat_id: ChatId, event: RawInboundEvent) -> Result<(), WhatSignalError> {
        let reaction_target = event
            .reaction
            .as_ref()
            .map(|r| r.target_message_id.clone())
            .unwrap_or_else(|| event.message_id.clone());
        let (target_session_or_destination, _source_transport, target_transport) =
            self.resolve_direction(&event)?;
        let mapping = self
            .lookup_mapping(&event.source, &reaction_target)
            .await?
            .ok_or_else(|| WhatSignalError::MappingNotFound(reaction_target))?;

        let target = SendTarget::new(chat_id, target_session_or_destination);
        target_transport
            .delete(&target, opposite_message_id(&event.source, &mapping))
            .await
    }

    /// Identify the target session/destination, source transport, and
    /// target transport for an event based on its originating platform.
    fn resolve_direction(
        &self,
        event: &RawInboundEvent,
    ) -> Result<(String, Arc<dyn TransportClient>, Arc<dyn TransportClient>), WhatSignalError> {
        match event.source {
            MessengerSource::WhatsApp => {
                let destination = self
                    .channel_registry
                    .destination_for_session(&event.session_or_destination)
                    .ok_or_else(|| WhatSignalError::ChannelNotFound(event.session_or_destination.clone()))?
                    .to_string();
                Ok((
                    destination,
                    Arc::clone(&self.whatsapp_transport),
                    Arc::clone(&self.signal_transport),
                ))
            }
            MessengerSource::Signal => {
                let session = self
                    .channel_registry
                    .session_for_destination(&event.session_or_destination)
                    .ok_or_else(|| WhatSignalError::ChannelNotFound(event.session_or_destination.clone()))?
                    .to_string();
                Ok((
                    session,
                    Arc::clone(&self.signal_transport),
                    Arc::clone(&self.whatsapp_transport),
                ))
            }
        }
    }

    async fn lookup_mapping(
        &self,
        source: &MessengerSource,
        message_id: &str,
    ) -> Result<Option<MessageMapping>, WhatSignalError> {
        match source {
            MessengerSource::WhatsApp => self.mapping_store.get_by_whatsapp_id(message_id).await,
            MessengerSource::Signal => self.mapping_store.get_by_signal_id(message_id).await,
        }
    }

    async fn resolve_reply_target(
        &self,
        event: &RawInboundEvent,
        quoted_message_id: &str,
        source_chat_id: &ChatId,
    ) -> Result<String, WhatSignalError> {
        let mapping = self
            .lookup_mapping(&event.source, quoted_message_id)
            .await?
            .ok_or_else(|| WhatSignalError::MappingNotFound(quoted_message_id.to_string()))?;

        if mapping.whatsapp_chat_id.is_group() != source_chat_id.is_group() {
            return Err(WhatSignalError::ChatKindMismatch(format!(
                "quoted mapping chat kind disagrees with source for {quoted_message_id}"
            )));
        }

        Ok(opposite_message_id(&event.source, &mapping).to_string())
    }
}

#[cfg(test)]
impl Bridge {
    /// Construct a Bridge with a single shared mock transport for both
    /// directions and a minimal single-channel registry, for unit tests
    /// that only need classification-adjacent behaviour.
    pub fn new_for_test(transport: Arc<dyn TransportClient>) -> Self {
        let channel = domain::Channel::new(
            SessionName::new("primary").unwrap(),
            "+15551234567".to_string(),
        )
        .unwrap();
        Self {
            channel_registry: Arc::new(ChannelRegistry::new(&[channel]).unwrap()),
            mapping_store: Arc::new(crate::ports::MockMappingStorePort::new()),
            whatsapp_transport: Arc::clone(&transport),
            signal_transport: transport,
            media_router: Arc::new(MediaRouter::new(&[], &[], &[], &[], &std::collections::HashMap::new())),
            retry_config: RetryConfig::default(),
        }
    }
}

/// The counterpart message id to act on: a WhatsApp-sourced event acts on
/// the mapping's Signal id, and vice versa.
fn opposite_message_id<'a>(source: &MessengerSource, mapping: &'a MessageMapping) -> &'a str {
    match source {
        MessengerSource::WhatsApp => &mapping.signal_msg_id,
        MessengerSource::Signal => &mapping.whatsapp_msg_id,
    }
}

fn build_mapping(
    event: &RawInboundEvent,
    wa_session_name: &str,
    source_chat_id: &ChatId,
    sent_message_id: String,
    sent_timestamp: i64,
    media_type: MediaCategory,
) -> Result<MessageMapping, WhatSignalError> {
    let session_name = SessionName::new(wa_session_name.to_string())?;

    let mapping = match event.source {
        MessengerSource::WhatsApp => MessageMapping::new(
            source_chat_id.clone(),
            event.message_id.clone(),
            sent_message_id,
            sent_timestamp,
            session_name,
            media_type,
        )?,
        MessengerSource::Signal => MessageMapping::new(
            source_chat_id.clone(),
            sent_message_id,
            event.message_id.clone(),
            event.timestamp,
            session_name,
            media_type,
        )?,
    };
    Ok(mapping)
}
