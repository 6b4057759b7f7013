//! Media category classification

use std::fmt;

use serde::{Deserialize, Serialize};

/// The coarse media category a relayed attachment falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Text,
    Image,
    Video,
    Voice,
    Document,
}

impl MediaCategory {
    /// The config-key form of this category (`image`, `video`, ...).
    #[must_use]
    pub const fn config_key(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Voice => "voice",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.config_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_key_matches_variant() {
        assert_eq!(MediaCategory::Image.config_key(), "image");
        assert_eq!(MediaCategory::Document.config_key(), "document");
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&MediaCategory::Voice).unwrap(),
            "\"voice\""
        );
    }
}
