//! Encryption port - Interface for encrypting and decrypting sensitive data
//!
//! This port defines how the application layer handles encryption of
//! sensitive memory content at rest.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::WhatSignalError;

/// Port for encrypting and decrypting data
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EncryptionPort: Send + Sync {
    /// Encrypt plaintext data
    ///
    /// Returns the encrypted data as bytes (includes nonce/IV).
    async fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, WhatSignalError>;

    /// Decrypt ciphertext data
    ///
    /// Returns the original plaintext data.
    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, WhatSignalError>;

    /// Encrypt a string and return base64-encoded ciphertext
    ///
    /// Convenience method for encrypting string content.
    async fn encrypt_string(&self, plaintext: &str) -> Result<String, WhatSignalError> {
        let encrypted = self.encrypt(plaintext.as_bytes()).await?;
        Ok(base64_encode(&encrypted))
    }

    /// Decrypt base64-encoded ciphertext and return the original string
    ///
    /// Convenience method for decrypting string content.
    async fn decrypt_string(&self, ciphertext: &str) -> Result<String, WhatSignalError> {
        let decoded = base64_decode(ciphertext)
            .map_err(|e| WhatSignalError::Internal(format!("Failed to decode base64: {e}")))?;
        let decrypted = self.decrypt(&decoded).await?;
        String::from_utf8(decrypted).map_err(|e| {
            WhatSignalError::Internal(format!("Decrypted data is not valid UTF-8: {e}"))
        })
    }

    /// Check if encryption is enabled
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Base64 encode bytes to string
fn base64_encode(data: &[u8]) -> String {
    use base64::{Engine, engine::general_purpose::STANDARD};
    STANDARD.encode(data)
}

/// Base64 decode string to bytes
fn base64_decode(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    use base64::{Engine, engine::general_purpose::STANDARD};
    STANDARD.decode(data)
}

/// No-op encryption implementation for when encryption is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEncryption;

#[async_trait]
impl EncryptionPort for NoOpEncryption {
    async fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, WhatSignalError> {
        Ok(plaintext.to_vec())
    }

    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, WhatSignalError> {
        Ok(ciphertext.to_vec())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
