//! Mapping delivery-status state machine

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Delivery status of a relayed message, tracked on its `MessageMapping` row.
///
/// Legal transitions: `Pending -> Delivered -> Read`, and any state `->
/// Failed`. All other transitions (including no-ops other than the
/// identity transition) are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Delivered,
    Failed,
    Read,
}

impl DeliveryStatus {
    /// Validate that transitioning from `self` to `next` is legal, per the
    /// monotonic rule `pending -> delivered -> read`, any state `-> failed`.
    pub fn validate_transition(self, next: Self) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::IllegalStatusTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next {
            return true;
        }
        match (self, next) {
            (_, Self::Failed) => true,
            (Self::Pending, Self::Delivered | Self::Read) => true,
            (Self::Delivered, Self::Read) => true,
            _ => false,
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
            Self::Read => "read",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_to_delivered_is_legal() {
        assert!(DeliveryStatus::Pending.can_transition_to(DeliveryStatus::Delivered));
    }

    #[test]
    fn delivered_to_read_is_legal() {
        assert!(DeliveryStatus::Delivered.can_transition_to(DeliveryStatus::Read));
    }

    #[test]
    fn pending_to_read_is_legal_direct_jump() {
        assert!(DeliveryStatus::Pending.can_transition_to(DeliveryStatus::Read));
    }

    #[test]
    fn any_state_to_failed_is_legal() {
        assert!(DeliveryStatus::Pending.can_transition_to(DeliveryStatus::Failed));
        assert!(DeliveryStatus::Delivered.can_transition_to(DeliveryStatus::Failed));
        assert!(DeliveryStatus::Read.can_transition_to(DeliveryStatus::Failed));
    }

    #[test]
    fn read_to_pending_is_illegal() {
        assert!(!DeliveryStatus::Read.can_transition_to(DeliveryStatus::Pending));
        assert!(DeliveryStatus::Read.validate_transition(DeliveryStatus::Pending).is_err());
    }

    #[test]
    fn delivered_to_pending_is_illegal() {
        assert!(!DeliveryStatus::Delivered.can_transition_to(DeliveryStatus::Pending));
    }

    #[test]
    fn failed_to_anything_but_failed_is_illegal() {
        assert!(!DeliveryStatus::Failed.can_transition_to(DeliveryStatus::Pending));
        assert!(!DeliveryStatus::Failed.can_transition_to(DeliveryStatus::Delivered));
    }

    #[test]
    fn identity_transition_is_legal() {
        assert!(DeliveryStatus::Delivered.can_transition_to(DeliveryStatus::Delivered));
    }
}
