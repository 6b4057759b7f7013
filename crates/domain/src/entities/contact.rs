//! Contact — cached WhatsApp address-book entry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::ContactId;

/// A cached WhatsApp contact. Never authoritative — the gateway remains
/// source of truth; this is a read-through cache refreshed lazily.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub contact_id: ContactId,
    pub phone_number: String,
    pub name: Option<String>,
    pub push_name: Option<String>,
    pub short_name: Option<String>,
    pub is_blocked: bool,
    pub is_group: bool,
    pub is_my_contact: bool,
    pub cached_at: DateTime<Utc>,
}

impl Contact {
    /// Whether this cache entry is stale relative to the configured cache
    /// horizon and should be refreshed before use.
    #[must_use]
    pub fn is_stale(&self, horizon: chrono::Duration) -> bool {
        Utc::now() - self.cached_at > horizon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Contact {
        Contact {
            contact_id: ContactId::new(),
            phone_number: "+1234567890".to_string(),
            name: Some("Alice".to_string()),
            push_name: None,
            short_name: None,
            is_blocked: false,
            is_group: false,
            is_my_contact: true,
            cached_at: Utc::now(),
        }
    }

    #[test]
    fn fresh_contact_is_not_stale() {
        let contact = sample();
        assert!(!contact.is_stale(chrono::Duration::hours(24)));
    }

    #[test]
    fn old_contact_is_stale() {
        let mut contact = sample();
        contact.cached_at = Utc::now() - chrono::Duration::hours(48);
        assert!(contact.is_stale(chrono::Duration::hours(24)));
    }
}
