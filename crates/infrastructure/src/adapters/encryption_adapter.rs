//! ChaCha20Poly1305 encryption adapter
//!
//! Provides authenticated encryption for sensitive memory content using
//! the XChaCha20-Poly1305 AEAD cipher.

use std::path::Path;

use application::{error::WhatSignalError, ports::EncryptionPort};
use async_trait::async_trait;
use chacha20poly1305::{
    XChaCha20Poly1305,
    aead::{Aead, KeyInit, OsRng, rand_core::RngCore},
};
use tracing::{debug, instrument, warn};

/// Nonce size for XChaCha20-Poly1305 (24 bytes)
const NONCE_SIZE: usize = 24;

/// Key size for XChaCha20-Poly1305 (256 bits = 32 bytes)
const KEY_SIZE: usize = 32;

/// XChaCha20-Poly1305 encryption adapter
///
/// Uses XChaCha20-Poly1305 for authenticated encryption with:
/// - 256-bit key
/// - 192-bit nonce (safer than ChaCha20's 96-bit nonce)
/// - Poly1305 MAC for authentication
pub struct ChaChaEncryptionAdapter {
    cipher: XChaCha20Poly1305,
}

impl std::fmt::Debug for ChaChaEncryptionAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChaChaEncryptionAdapter")
            .field("cipher", &"[XChaCha20Poly1305]")
            .finish()
    }
}

impl ChaChaEncryptionAdapter {
    /// Create a new encryption adapter with the given key
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not exactly 32 bytes.
    pub fn new(key: &[u8]) -> Result<Self, WhatSignalError> {
        if key.len() != KEY_SIZE {
            return Err(WhatSignalError::Config(format!(
                "Encryption key must be {KEY_SIZE} bytes, got {}",
                key.len()
            )));
        }

        let cipher = XChaCha20Poly1305::new_from_slice(key).map_err(|e| {
            WhatSignalError::Config(format!("Invalid encryption key: {e}"))
        })?;

        debug!("Initialized ChaCha20Poly1305 encryption adapter");

        Ok(Self { cipher })
    }

    /// Create from a key file
    ///
    /// The key file should contain exactly 32 bytes of random data.
    pub fn from_key_file(path: &Path) -> Result<Self, WhatSignalError> {
        let key = std::fs::read(path).map_err(|e| {
            WhatSignalError::Config(format!(
                "Failed to read encryption key file '{}': {e}",
                path.display()
            ))
        })?;

        Self::new(&key)
    }

    /// Generate a new random encryption key
    #[must_use]
    pub fn generate_key() -> [u8; KEY_SIZE] {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        key
    }

    /// Generate a random nonce
    fn generate_nonce() -> [u8; NONCE_SIZE] {
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);
        nonce
    }
}

#[async_trait]
impl EncryptionPort for ChaChaEncryptionAdapter {
    #[instrument(skip(self, plaintext), fields(plaintext_len = plaintext.len()))]
    async fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, WhatSignalError> {
        // Generate a random nonce
        let nonce = Self::generate_nonce();
        let nonce_arr = chacha20poly1305::XNonce::from_slice(&nonce);

        // Encrypt the plaintext
        let ciphertext = self.cipher.encrypt(nonce_arr, plaintext).map_err(|e| {
            warn!(error = %e, "Encryption failed");
            WhatSignalError::Internal(format!("Encryption failed: {e}"))
        })?;

        // Prepend nonce to ciphertext (nonce || ciphertext)
        let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce);
        result.extend_from_slice(&ciphertext);

        debug!(
            ciphertext_len = result.len(),
            "Successfully encrypted data"
        );

        Ok(result)
    }

    #[instrument(skip(self, ciphertext), fields(ciphertext_len = ciphertext.len()))]
    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, WhatSignalError> {
        if ciphertext.len() < NONCE_SIZE {
            return Err(WhatSignalError::Internal(
                "Ciphertext too short - missing nonce".to_string(),
            ));
        }

        // Extract nonce and ciphertext
        let (nonce_bytes, encrypted) = ciphertext.split_at(NONCE_SIZE);
        let nonce = chacha20poly1305::XNonce::from_slice(nonce_bytes);

        // Decrypt
        let plaintext = self.cipher.decrypt(nonce, encrypted).map_err(|e| {
            warn!(error = %e, "Decryption failed - data may be corrupted or key mismatch");
            WhatSignalError::Internal(format!("Decryption failed: {e}"))
        })?;

        debug!(
            plaintext_len = plaintext.len(),
            "Successfully decrypted data"
        );

        Ok(plaintext)
    }

    fn is_enabled(&self) -> bool {
        true
    }
}
