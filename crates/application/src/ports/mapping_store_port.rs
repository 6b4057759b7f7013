//! Port for persisting and querying WhatsApp <-> Signal message mappings

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use domain::{Contact, MessageMapping};

use crate::WhatSignalError;

/// Persists the correlation between a WhatsApp message and its mirrored
/// Signal message, and the cached contact directory used to resolve
/// display names for outbound Signal messages.
///
/// Implemented by `infrastructure`'s SQLite-backed adapter; mocked here for
/// service-level unit tests.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait MappingStorePort: Send + Sync {
    /// Persist a new mapping.
    async fn save(&self, mapping: &MessageMapping) -> Result<(), WhatSignalError>;

    /// Look up a mapping by its WhatsApp message id.
    async fn get_by_whatsapp_id(
        &self,
        whatsapp_msg_id: &str,
    ) -> Result<Option<MessageMapping>, WhatSignalError>;

    /// Look up a mapping by its Signal message id.
    async fn get_by_signal_id(
        &self,
        signal_msg_id: &str,
    ) -> Result<Option<MessageMapping>, WhatSignalError>;

    /// Fallback routing: the most recently forwarded mapping for a given
    /// session and chat, used when a reply quotes a message with no known
    /// mapping (spec's fallback routing heuristic).
    async fn get_latest_by_session_and_chat(
        &self,
        session_name: &str,
        whatsapp_chat_id: &str,
    ) -> Result<Option<MessageMapping>, WhatSignalError>;

    /// Update the delivery status of an existing mapping.
    async fn update_delivery_status(
        &self,
        whatsapp_msg_id: &str,
        status: domain::DeliveryStatus,
    ) -> Result<(), WhatSignalError>;

    /// Delete mappings older than the retention horizon. Returns the number
    /// of rows removed.
    async fn cleanup(&self, older_than: chrono::DateTime<chrono::Utc>) -> Result<u64, WhatSignalError>;

    /// Upsert a cached contact record.
    async fn save_contact(&self, contact: &Contact) -> Result<(), WhatSignalError>;

    /// Look up a cached contact by id.
    async fn get_contact(
        &self,
        contact_id: domain::ContactId,
    ) -> Result<Option<Contact>, WhatSignalError>;

    /// Look up a cached contact by phone number.
    async fn get_contact_by_phone(
        &self,
        phone_number: &str,
    ) -> Result<Option<Contact>, WhatSignalError>;

    /// Evict contact cache entries older than the retention horizon.
    async fn cleanup_contacts(
        &self,
        older_than: chrono::DateTime<chrono::Utc>,
    ) -> Result<u64, WhatSignalError>;

    /// Cheap connectivity check for the `/health` endpoint.
    async fn health_check(&self) -> Result<(), WhatSignalError>;
}
