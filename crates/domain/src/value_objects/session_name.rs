//! WhatsApp session name value object

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// The logical name of a WhatsApp-side account, e.g. `personal`, `business`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionName(String);

impl SessionName {
    /// Create a new session name, rejecting empty or whitespace-only input.
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidSessionName(
                "session name must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the session name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SessionName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for SessionName {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_non_empty_name() {
        let name = SessionName::new("personal").unwrap();
        assert_eq!(name.as_str(), "personal");
    }

    #[test]
    fn trims_whitespace() {
        let name = SessionName::new("  business  ").unwrap();
        assert_eq!(name.as_str(), "business");
    }

    #[test]
    fn rejects_empty() {
        assert!(SessionName::new("").is_err());
        assert!(SessionName::new("   ").is_err());
    }
}
