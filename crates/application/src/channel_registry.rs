//! Channel Registry: bidirectional lookup between a WhatsApp session and
//! its paired Signal destination number
//!
//! Built once at startup from configuration and read-only afterwards;
//! lookups are `O(1)` hash map gets with no locking.

use std::collections::HashMap;

use domain::Channel;

use crate::WhatSignalError;

/// Bidirectional, immutable mapping between WhatsApp session names and
/// Signal destination phone numbers.
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    session_to_destination: HashMap<String, String>,
    destination_to_session: HashMap<String, String>,
}

impl ChannelRegistry {
    /// Build a registry from the configured channel set.
    ///
    /// # Errors
    ///
    /// Returns [`WhatSignalError::Config`] if `channels` is empty, if any
    /// session name or destination number is duplicated, or if either
    /// field of a channel is empty.
    pub fn new(channels: &[Channel]) -> Result<Self, WhatSignalError> {
        if channels.is_empty() {
            return Err(WhatSignalError::Config(
                "channel registry requires at least one channel".to_string(),
            ));
        }

        let mut session_to_destination = HashMap::with_capacity(channels.len());
        let mut destination_to_session = HashMap::with_capacity(channels.len());

        for channel in channels {
            let session = channel.whatsapp_session_name.as_str();
            let destination = channel.signal_destination_phone_number.as_str();

            if session.is_empty() || destination.is_empty() {
                return Err(WhatSignalError::Config(
                    "channel session name and destination must be non-empty".to_string(),
                ));
            }

            if session_to_destination
                .insert(session.to_string(), destination.to_string())
                .is_some()
            {
                return Err(WhatSignalError::Config(format!(
                    "duplicate session name in channel registry: {session}"
                )));
            }

            if destination_to_session
                .insert(destination.to_string(), session.to_string())
                .is_some()
            {
                return Err(WhatSignalError::Config(format!(
                    "duplicate destination number in channel registry: {destination}"
                )));
            }
        }

        Ok(Self {
            session_to_destination,
            destination_to_session,
        })
    }

    /// Resolve a WhatsApp session name to its paired Signal destination.
    #[must_use]
    pub fn destination_for_session(&self, session: &str) -> Option<&str> {
        self.session_to_destination.get(session).map(String::as_str)
    }

    /// Resolve a Signal destination (account) number to its paired
    /// WhatsApp session name.
    #[must_use]
    pub fn session_for_destination(&self, destination: &str) -> Option<&str> {
        self.destination_to_session.get(destination).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.session_to_destination.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.session_to_destination.is_empty()
    }
}
