//! Chat identifier value object and canonicalisation rules
//!
//! WhatsApp chats are addressed in two canonical forms: a direct chat as
//! `<e164-digits>@c.us` and a group chat as `<digits>@g.us`. Signal has no
//! native chat-id concept; its group sources are prefixed `group.` and are
//! translated to the `@g.us` form when crossing platforms.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

const DIRECT_SUFFIX: &str = "@c.us";
const GROUP_SUFFIX: &str = "@g.us";

/// Whether a chat id names a direct (1:1) chat or a group chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatKind {
    Direct,
    Group,
}

/// A canonicalised WhatsApp-style chat identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId {
    value: String,
    kind: ChatKind,
}

impl ChatId {
    /// Build a direct-chat id from a bare E.164 number (with or without `+`).
    pub fn direct(number: impl AsRef<str>) -> Result<Self, DomainError> {
        let digits = strip_leading_plus(number.as_ref());
        validate_digits(&digits)?;
        Ok(Self {
            value: format!("{digits}{DIRECT_SUFFIX}"),
            kind: ChatKind::Direct,
        })
    }

    /// Build a group-chat id from a bare numeric group id.
    pub fn group(digits: impl AsRef<str>) -> Result<Self, DomainError> {
        let digits = digits.as_ref();
        validate_digits(digits)?;
        Ok(Self {
            value: format!("{digits}{GROUP_SUFFIX}"),
            kind: ChatKind::Group,
        })
    }

    /// Parse an already-canonical chat id such as `1234567890@c.us`.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let raw = raw.as_ref().trim();
        if let Some(digits) = raw.strip_suffix(DIRECT_SUFFIX) {
            validate_digits(digits)?;
            return Ok(Self {
                value: raw.to_string(),
                kind: ChatKind::Direct,
            });
        }
        if let Some(digits) = raw.strip_suffix(GROUP_SUFFIX) {
            validate_digits(digits)?;
            return Ok(Self {
                value: raw.to_string(),
                kind: ChatKind::Group,
            });
        }
        Err(DomainError::InvalidChatId(format!(
            "chat id must end in {DIRECT_SUFFIX} or {GROUP_SUFFIX}: {raw}"
        )))
    }

    /// Translate a Signal source into the canonical WhatsApp-style form.
    ///
    /// Signal group sources are prefixed `group.<digits>`; everything else
    /// is treated as a direct-chat phone number.
    pub fn from_signal_source(source: impl AsRef<str>) -> Result<Self, DomainError> {
        let source = source.as_ref();
        if let Some(rest) = source.strip_prefix("group.") {
            Self::group(rest)
        } else {
            Self::direct(source)
        }
    }

    /// The canonical string form, e.g. `1234567890@c.us`.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Whether this id names a direct chat or a group.
    pub const fn kind(&self) -> ChatKind {
        self.kind
    }

    pub const fn is_group(&self) -> bool {
        matches!(self.kind, ChatKind::Group)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

fn strip_leading_plus(s: &str) -> String {
    s.strip_prefix('+').unwrap_or(s).to_string()
}

fn validate_digits(digits: &str) -> Result<(), DomainError> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(DomainError::InvalidChatId(format!(
            "expected only digits, got: {digits}"
        )));
    }
    Ok(())
}
