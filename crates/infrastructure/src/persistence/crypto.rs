//! Deterministic blind-index helper for encrypted, still-indexable columns.
//!
//! Sensitive mapping-store columns (`whatsapp_chat_id`, `whatsapp_msg_id`,
//! `signal_msg_id`, `phone_number`) are stored encrypted and therefore
//! unusable in a `WHERE` clause directly. Each carries a sibling
//! `*_index` column holding `HMAC-SHA256(index_key, value)` so equality
//! lookups stay `O(log n)` via a plain SQLite index without ever
//! decrypting rows that don't match.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the blind index for `value` under `index_key`.
pub fn blind_index(index_key: &[u8], value: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(index_key).expect("HMAC accepts a key of any length");
    mac.update(value.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_same_input() {
        let key = b"test-index-key";
        assert_eq!(blind_index(key, "wamid.T1"), blind_index(key, "wamid.T1"));
    }

    #[test]
    fn differs_for_different_input() {
        let key = b"test-index-key";
        assert_ne!(blind_index(key, "wamid.T1"), blind_index(key, "wamid.T2"));
    }

    #[test]
    fn differs_for_different_key() {
        assert_ne!(
            blind_index(b"key-a", "wamid.T1"),
            blind_index(b"key-b", "wamid.T1")
        );
    }
}
