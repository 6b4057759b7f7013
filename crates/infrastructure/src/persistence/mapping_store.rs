//! SQLite-backed `MappingStorePort` implementation
//!
//! Sensitive columns are encrypted at rest via the configured
//! `EncryptionPort` and paired with a deterministic blind index (see
//! `crate::persistence::crypto`) so equality lookups remain possible
//! without decrypting every candidate row.

use std::sync::Arc;

use application::{
    error::WhatSignalError,
    ports::{EncryptionPort, MappingStorePort},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{ChatId, Contact, ContactId, DeliveryStatus, MediaCategory, MessageMapping, SessionName};
use rusqlite::{OptionalExtension, params};
use tokio::task;
use tracing::{debug, instrument};

use super::connection::ConnectionPool;
use super::crypto::blind_index;

/// SQLite-based mapping store.
#[derive(Clone)]
pub struct SqliteMappingStore {
    pool: Arc<ConnectionPool>,
    encryption: Arc<dyn EncryptionPort>,
    index_key: Arc<Vec<u8>>,
}

impl SqliteMappingStore {
    /// Create a new store. `index_key` seeds the deterministic blind index
    /// and should be derived independently from the encryption key.
    #[must_use]
    pub fn new(
        pool: Arc<ConnectionPool>,
        encryption: Arc<dyn EncryptionPort>,
        index_key: Vec<u8>,
    ) -> Self {
        Self {
            pool,
            encryption,
            index_key: Arc::new(index_key),
        }
    }

    fn index(&self, value: &str) -> String {
        blind_index(&self.index_key, value)
    }
}

fn parse_media_category(raw: &str) -> Result<MediaCategory, WhatSignalError> {
    match raw {
        "text" => Ok(MediaCategory::Text),
        "image" => Ok(MediaCategory::Image),
        "video" => Ok(MediaCategory::Video),
        "voice" => Ok(MediaCategory::Voice),
        "document" => Ok(MediaCategory::Document),
        other => Err(WhatSignalError::Internal(format!(
            "unknown stored media category: {other}"
        ))),
    }
}

fn parse_delivery_status(raw: &str) -> Result<DeliveryStatus, WhatSignalError> {
    match raw {
        "pending" => Ok(DeliveryStatus::Pending),
        "delivered" => Ok(DeliveryStatus::Delivered),
        "failed" => Ok(DeliveryStatus::Failed),
        "read" => Ok(DeliveryStatus::Read),
        other => Err(WhatSignalError::Internal(format!(
            "unknown stored delivery status: {other}"
        ))),
    }
}

fn parse_rfc3339(raw: &str) -> Result<DateTime<Utc>, WhatSignalError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| WhatSignalError::Internal(format!("invalid stored timestamp: {e}")))
}

/// Row shape read back before decryption: encrypted blobs plus the plain
/// columns needed to finish reconstructing a `MessageMapping`.
struct EncryptedMappingRow {
    whatsapp_chat_id: Vec<u8>,
    whatsapp_msg_id: Vec<u8>,
    signal_msg_id: Vec<u8>,
    signal_timestamp: i64,
    session_name: String,
    media_type: String,
    delivery_status: String,
    forwarded_at: String,
    created_at: String,
    updated_at: String,
}

const SELECT_MAPPING_COLUMNS: &str = "whatsapp_chat_id, whatsapp_msg_id, signal_msg_id, \
    signal_timestamp, session_name, media_type, delivery_status, forwarded_at, created_at, updated_at";

fn row_to_encrypted_mapping(row: &rusqlite::Row<'_>) -> rusqlite::Result<EncryptedMappingRow> {
    Ok(EncryptedMappingRow {
        whatsapp_chat_id: row.get(0)?,
        whatsapp_msg_id: row.get(1)?,
        signal_msg_id: row.get(2)?,
        signal_timestamp: row.get(3)?,
        session_name: row.get(4)?,
        media_type: row.get(5)?,
        delivery_status: row.get(6)?,
        forwarded_at: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl SqliteMappingStore {
    async fn decrypt_mapping(
        &self,
        row: EncryptedMappingRow,
    ) -> Result<MessageMapping, WhatSignalError> {
        let chat_id_bytes = self.encryption.decrypt(&row.whatsapp_chat_id).await?;
        let whatsapp_msg_id_bytes = self.encryption.decrypt(&row.whatsapp_msg_id).await?;
        let signal_msg_id_bytes = self.encryption.decrypt(&row.signal_msg_id).await?;

        let chat_id_str = String::from_utf8(chat_id_bytes)
            .map_err(|e| WhatSignalError::Internal(format!("corrupt chat id: {e}")))?;
        let whatsapp_msg_id = String::from_utf8(whatsapp_msg_id_bytes)
            .map_err(|e| WhatSignalError::Internal(format!("corrupt whatsapp msg id: {e}")))?;
        let signal_msg_id = String::from_utf8(signal_msg_id_bytes)
            .map_err(|e| WhatSignalError::Internal(format!("corrupt signal msg id: {e}")))?;

        Ok(MessageMapping {
            whatsapp_chat_id: ChatId::parse(&chat_id_str)?,
            whatsapp_msg_id,
            signal_msg_id,
            signal_timestamp: row.signal_timestamp,
            session_name: SessionName::new(row.session_name)?,
            media_type: parse_media_category(&row.media_type)?,
            delivery_status: parse_delivery_status(&row.delivery_status)?,
            forwarded_at: parse_rfc3339(&row.forwarded_at)?,
            created_at: parse_rfc3339(&row.created_at)?,
            updated_at: parse_rfc3339(&row.updated_at)?,
        })
    }
}

#[async_trait]
impl MappingStorePort for SqliteMappingStore {
    #[instrument(skip(self, mapping), fields(session = %mapping.session_name))]
    async fn save(&self, mapping: &MessageMapping) -> Result<(), WhatSignalError> {
        let chat_id_index = self.index(mapping.whatsapp_chat_id.as_str());
        let whatsapp_msg_id_index = self.index(&mapping.whatsapp_msg_id);
        let signal_msg_id_index = self.index(&mapping.signal_msg_id);

        let chat_id_enc = self
            .encryption
            .encrypt(mapping.whatsapp_chat_id.as_str().as_bytes())
            .await?;
        let whatsapp_msg_id_enc = self.encryption.encrypt(mapping.whatsapp_msg_id.as_bytes()).await?;
        let signal_msg_id_enc = self.encryption.encrypt(mapping.signal_msg_id.as_bytes()).await?;

        let pool = Arc::clone(&self.pool);
        let session_name = mapping.session_name.as_str().to_string();
        let media_type = mapping.media_type.config_key().to_string();
        let delivery_status = mapping.delivery_status.to_string();
        let signal_timestamp = mapping.signal_timestamp;
        let forwarded_at = mapping.forwarded_at.to_rfc3339();
        let created_at = mapping.created_at.to_rfc3339();
        let updated_at = mapping.updated_at.to_rfc3339();

        task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| WhatSignalError::Internal(e.to_string()))?;

            // Idempotent upsert on the composite PK (spec: "save(mapping) —
            // idempotent upsert on the composite PK").
            conn.execute(
                "INSERT INTO message_mappings (
                    whatsapp_chat_id, whatsapp_chat_id_index, whatsapp_msg_id, whatsapp_msg_id_index,
                    signal_msg_id, signal_msg_id_index, signal_timestamp, session_name, media_type,
                    delivery_status, forwarded_at, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                ON CONFLICT(whatsapp_msg_id_index, signal_msg_id_index) DO UPDATE SET
                    delivery_status = excluded.delivery_status,
                    updated_at = excluded.updated_at",
                params![
                    chat_id_enc,
                    chat_id_index,
                    whatsapp_msg_id_enc,
                    whatsapp_msg_id_index,
                    signal_msg_id_enc,
                    signal_msg_id_index,
                    signal_timestamp,
                    session_name,
                    media_type,
                    delivery_status,
                    forwarded_at,
                    created_at,
                    updated_at,
                ],
            )
            .map_err(|e| WhatSignalError::Internal(e.to_string()))?;

            debug!("Saved message mapping");
            Ok(())
        })
        .await
        .map_err(|e| WhatSignalError::Internal(e.to_string()))?
    }

    #[instrument(skip(self))]
    async fn get_by_whatsapp_id(
        &self,
        whatsapp_msg_id: &str,
    ) -> Result<Option<MessageMapping>, WhatSignalError> {
        let index = self.index(whatsapp_msg_id);
        let pool = Arc::clone(&self.pool);

        let row = task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| WhatSignalError::Internal(e.to_string()))?;

            conn.query_row(
                &format!(
                    "SELECT {SELECT_MAPPING_COLUMNS} FROM message_mappings \
                     WHERE whatsapp_msg_id_index = ?1 ORDER BY created_at DESC LIMIT 1"
                ),
                [&index],
                row_to_encrypted_mapping,
            )
            .optional()
            .map_err(|e| WhatSignalError::Internal(e.to_string()))
        })
        .await
        .map_err(|e| WhatSignalError::Internal(e.to_string()))??;

        match row {
            Some(row) => Ok(Some(self.decrypt_mapping(row).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn get_by_signal_id(
        &self,
        signal_msg_id: &str,
    ) -> Result<Option<MessageMapping>, WhatSignalError> {
        let index = self.index(signal_msg_id);
        let pool = Arc::clone(&self.pool);

        let row = task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| WhatSignalError::Internal(e.to_string()))?;

            conn.query_row(
                &format!(
                    "SELECT {SELECT_MAPPING_COLUMNS} FROM message_mappings \
                     WHERE signal_msg_id_index = ?1 ORDER BY created_at DESC LIMIT 1"
                ),
                [&index],
                row_to_encrypted_mapping,
            )
            .optional()
            .map_err(|e| WhatSignalError::Internal(e.to_string()))
        })
        .await
        .map_err(|e| WhatSignalError::Internal(e.to_string()))??;

        match row {
            Some(row) => Ok(Some(self.decrypt_mapping(row).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn get_latest_by_session_and_chat(
        &self,
        session_name: &str,
        whatsapp_chat_id: &str,
    ) -> Result<Option<MessageMapping>, WhatSignalError> {
        let chat_index = self.index(whatsapp_chat_id);
        let session_name = session_name.to_string();
        let pool = Arc::clone(&self.pool);

        let row = task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| WhatSignalError::Internal(e.to_string()))?;

            conn.query_row(
                &format!(
                    "SELECT {SELECT_MAPPING_COLUMNS} FROM message_mappings \
                     WHERE session_name = ?1 AND whatsapp_chat_id_index = ?2 \
                     ORDER BY created_at DESC LIMIT 1"
                ),
                params![session_name, chat_index],
                row_to_encrypted_mapping,
            )
            .optional()
            .map_err(|e| WhatSignalError::Internal(e.to_string()))
        })
        .await
        .map_err(|e| WhatSignalError::Internal(e.to_string()))??;

        match row {
            Some(row) => Ok(Some(self.decrypt_mapping(row).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn update_delivery_status(
        &self,
        whatsapp_msg_id: &str,
        status: DeliveryStatus,
    ) -> Result<(), WhatSignalError> {
        let index = self.index(whatsapp_msg_id);
        let whatsapp_msg_id = whatsapp_msg_id.to_string();
        let pool = Arc::clone(&self.pool);
        let updated_at = Utc::now().to_rfc3339();
        let next = status.to_string();

        task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| WhatSignalError::Internal(e.to_string()))?;

            let current: Option<(i64, String)> = conn
                .query_row(
                    "SELECT rowid, delivery_status FROM message_mappings \
                     WHERE whatsapp_msg_id_index = ?1 ORDER BY created_at DESC LIMIT 1",
                    [&index],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .map_err(|e| WhatSignalError::Internal(e.to_string()))?;

            let Some((rowid, current_status)) = current else {
                return Err(WhatSignalError::MappingNotFound(whatsapp_msg_id.to_string()));
            };

            let current_status = parse_delivery_status(&current_status)?;
            current_status.validate_transition(status)?;

            conn.execute(
                "UPDATE message_mappings SET delivery_status = ?1, updated_at = ?2 WHERE rowid = ?3",
                params![next, updated_at, rowid],
            )
            .map_err(|e| WhatSignalError::Internal(e.to_string()))?;

            debug!(status = %status, "Updated delivery status");
            Ok(())
        })
        .await
        .map_err(|e| WhatSignalError::Internal(e.to_string()))?
    }

    #[instrument(skip(self))]
    async fn cleanup(&self, older_than: DateTime<Utc>) -> Result<u64, WhatSignalError> {
        let cutoff = older_than.to_rfc3339();
        let pool = Arc::clone(&self.pool);

        task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| WhatSignalError::Internal(e.to_string()))?;

            let deleted = conn
                .execute(
                    "DELETE FROM message_mappings WHERE forwarded_at < ?1",
                    [&cutoff],
                )
                .map_err(|e| WhatSignalError::Internal(e.to_string()))?;

            debug!(deleted_count = deleted, "Cleaned up stale mappings");
            Ok(deleted as u64)
        })
        .await
        .map_err(|e| WhatSignalError::Internal(e.to_string()))?
    }

    #[instrument(skip(self, contact), fields(contact_id = %contact.contact_id))]
    async fn save_contact(&self, contact: &Contact) -> Result<(), WhatSignalError> {
        let phone_index = self.index(&contact.phone_number);
        let phone_enc = self.encryption.encrypt(contact.phone_number.as_bytes()).await?;

        let pool = Arc::clone(&self.pool);
        let contact_id = contact.contact_id.as_uuid().to_string();
        let name = contact.name.clone();
        let push_name = contact.push_name.clone();
        let short_name = contact.short_name.clone();
        let is_blocked = contact.is_blocked;
        let is_group = contact.is_group;
        let is_my_contact = contact.is_my_contact;
        let cached_at = contact.cached_at.to_rfc3339();

        task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| WhatSignalError::Internal(e.to_string()))?;

            conn.execute(
                "INSERT INTO contacts (
                    contact_id, phone_number, phone_number_index, name, push_name, short_name,
                    is_blocked, is_group, is_my_contact, cached_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(contact_id) DO UPDATE SET
                    phone_number = excluded.phone_number,
                    phone_number_index = excluded.phone_number_index,
                    name = excluded.name,
                    push_name = excluded.push_name,
                    short_name = excluded.short_name,
                    is_blocked = excluded.is_blocked,
                    is_group = excluded.is_group,
                    is_my_contact = excluded.is_my_contact,
                    cached_at = excluded.cached_at",
                params![
                    contact_id,
                    phone_enc,
                    phone_index,
                    name,
                    push_name,
                    short_name,
                    is_blocked,
                    is_group,
                    is_my_contact,
                    cached_at,
                ],
            )
            .map_err(|e| WhatSignalError::Internal(e.to_string()))?;

            debug!("Saved contact");
            Ok(())
        })
        .await
        .map_err(|e| WhatSignalError::Internal(e.to_string()))?
    }

    #[instrument(skip(self))]
    async fn get_contact(
        &self,
        contact_id: ContactId,
    ) -> Result<Option<Contact>, WhatSignalError> {
        let id_str = contact_id.as_uuid().to_string();
        let pool = Arc::clone(&self.pool);

        let row = task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| WhatSignalError::Internal(e.to_string()))?;

            conn.query_row(
                "SELECT phone_number, name, push_name, short_name, is_blocked, is_group, \
                 is_my_contact, cached_at FROM contacts WHERE contact_id = ?1",
                [&id_str],
                row_to_encrypted_contact,
            )
            .optional()
            .map_err(|e| WhatSignalError::Internal(e.to_string()))
        })
        .await
        .map_err(|e| WhatSignalError::Internal(e.to_string()))??;

        match row {
            Some(row) => Ok(Some(self.decrypt_contact(contact_id, row).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn get_contact_by_phone(
        &self,
        phone_number: &str,
    ) -> Result<Option<Contact>, WhatSignalError> {
        self.get_contact_by_phone_impl(phone_number).await
    }

    #[instrument(skip(self))]
    async fn cleanup_contacts(&self, older_than: DateTime<Utc>) -> Result<u64, WhatSignalError> {
        let cutoff = older_than.to_rfc3339();
        let pool = Arc::clone(&self.pool);

        task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| WhatSignalError::Internal(e.to_string()))?;

            let deleted = conn
                .execute("DELETE FROM contacts WHERE cached_at < ?1", [&cutoff])
                .map_err(|e| WhatSignalError::Internal(e.to_string()))?;

            debug!(deleted_count = deleted, "Cleaned up stale contacts");
            Ok(deleted as u64)
        })
        .await
        .map_err(|e| WhatSignalError::Internal(e.to_string()))?
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), WhatSignalError> {
        let pool = Arc::clone(&self.pool);

        task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| WhatSignalError::Internal(e.to_string()))?;
            conn.query_row("SELECT 1", [], |_| Ok(()))
                .map_err(|e| WhatSignalError::Internal(e.to_string()))
        })
        .await
        .map_err(|e| WhatSignalError::Internal(e.to_string()))?
    }
}

struct EncryptedContactRow {
    phone_number: Vec<u8>,
    name: Option<String>,
    push_name: Option<String>,
    short_name: Option<String>,
    is_blocked: bool,
    is_group: bool,
    is_my_contact: bool,
    cached_at: String,
}

fn row_to_encrypted_contact(row: &rusqlite::Row<'_>) -> rusqlite::Result<EncryptedContactRow> {
    Ok(EncryptedContactRow {
        phone_number: row.get(0)?,
        name: row.get(1)?,
        push_name: row.get(2)?,
        short_name: row.get(3)?,
        is_blocked: row.get(4)?,
        is_group: row.get(5)?,
        is_my_contact: row.get(6)?,
        cached_at: row.get(7)?,
    })
}

impl SqliteMappingStore {
    async fn decrypt_contact(
        &self,
        contact_id: ContactId,
        row: EncryptedContactRow,
    ) -> Result<Contact, WhatSignalError> {
        let phone_bytes = self.encryption.decrypt(&row.phone_number).await?;
        let phone_number = String::from_utf8(phone_bytes)
            .map_err(|e| WhatSignalError::Internal(format!("corrupt phone number: {e}")))?;

        Ok(Contact {
            contact_id,
            phone_number,
            name: row.name,
            push_name: row.push_name,
            short_name: row.short_name,
            is_blocked: row.is_blocked,
            is_group: row.is_group,
            is_my_contact: row.is_my_contact,
            cached_at: parse_rfc3339(&row.cached_at)?,
        })
    }

    async fn get_contact_by_phone_impl(
        &self,
        phone_number: &str,
    ) -> Result<Option<Contact>, WhatSignalError> {
        let index = self.index(phone_number);
        let pool = Arc::clone(&self.pool);

        let row = task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| WhatSignalError::Internal(e.to_string()))?;

            conn.query_row(
                "SELECT contact_id, phone_number, name, push_name, short_name, is_blocked, \
                 is_group, is_my_contact, cached_at FROM contacts WHERE phone_number_index = ?1",
                [&index],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        EncryptedContactRow {
                            phone_number: row.get(1)?,
                            name: row.get(2)?,
                            push_name: row.get(3)?,
                            short_name: row.get(4)?,
                            is_blocked: row.get(5)?,
                            is_group: row.get(6)?,
                            is_my_contact: row.get(7)?,
                            cached_at: row.get(8)?,
                        },
                    ))
                },
            )
            .optional()
            .map_err(|e| WhatSignalError::Internal(e.to_string()))
        })
        .await
        .map_err(|e| WhatSignalError::Internal(e.to_string()))??;

        match row {
            Some((id_str, row)) => {
                let contact_id = ContactId::parse(&id_str)
                    .map_err(|e| WhatSignalError::Internal(format!("corrupt contact id: {e}")))?;
                Ok(Some(self.decrypt_contact(contact_id, row).await?))
            },
            None => Ok(None),
        }
    }
}
