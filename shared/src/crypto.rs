//! Symmetric encryption and blind indexing for PII columns.
//!
//! Two independent keys back this module:
//! - the encryption key, rotatable, with a key-id byte prefixed to every
//!   ciphertext so old rows stay decryptable after rotation
//! - the index key, used only for the HMAC blind index; rotating it requires
//!   a reindex of every blind-indexed column and is treated as an
//!   operational task, not something this module automates
//!
//! Grounded in the nonce-prepended AES-256-GCM scheme already used for
//! provider token storage elsewhere in this stack, extended here with the
//! key-id prefix needed to support rotation.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroize;

const NONCE_LEN: usize = 12;
const KEY_ID_LEN: usize = 1;
const BLIND_INDEX_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("ciphertext authentication failed")]
    DecryptError,
    #[error("unknown key id {0}")]
    KeyUnknown(u8),
    #[error("malformed ciphertext")]
    Malformed,
    #[error("invalid key material: {0}")]
    InvalidKey(String),
}

/// A single AES-256-GCM key identified by a one-byte id.
struct KeyEntry {
    id: u8,
    key: [u8; 32],
}

impl Drop for KeyEntry {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Encrypts and decrypts PII fields, and computes deterministic blind
/// indexes for equality lookup on the same fields.
///
/// Holds a small keyring so ciphertext written under an older key can still
/// be decrypted after the active key is rotated; new encryptions always use
/// the active (first) key.
pub struct CryptoBox {
    keyring: Vec<KeyEntry>,
    index_key: Vec<u8>,
}

impl CryptoBox {
    /// Builds a `CryptoBox` from a hex-encoded 32-byte encryption key, its
    /// key id, and a hex-encoded index key of any length.
    pub fn new(
        active_key_id: u8,
        encryption_key_hex: &str,
        index_key_hex: &str,
    ) -> Result<Self, CryptoError> {
        let key_bytes = hex::decode(encryption_key_hex)
            .map_err(|_| CryptoError::InvalidKey("encryption key is not valid hex".into()))?;
        if key_bytes.len() != 32 {
            return Err(CryptoError::InvalidKey(
                "encryption key must be 32 bytes (64 hex chars)".into(),
            ));
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&key_bytes);

        let index_key = hex::decode(index_key_hex)
            .map_err(|_| CryptoError::InvalidKey("index key is not valid hex".into()))?;
        if index_key.is_empty() {
            return Err(CryptoError::InvalidKey("index key must not be empty".into()));
        }

        Ok(Self {
            keyring: vec![KeyEntry { id: active_key_id, key }],
            index_key,
        })
    }

    /// Adds a retired key so rows encrypted under it remain decryptable.
    pub fn with_retired_key(mut self, key_id: u8, encryption_key_hex: &str) -> Result<Self, CryptoError> {
        let key_bytes = hex::decode(encryption_key_hex)
            .map_err(|_| CryptoError::InvalidKey("retired key is not valid hex".into()))?;
        if key_bytes.len() != 32 {
            return Err(CryptoError::InvalidKey(
                "retired key must be 32 bytes (64 hex chars)".into(),
            ));
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&key_bytes);
        self.keyring.push(KeyEntry { id: key_id, key });
        Ok(self)
    }

    /// Encrypts `plaintext` under the active key. Output layout is
    /// `[key_id][nonce][ciphertext+tag]`.
    pub fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>, CryptoError> {
        let active = self
            .keyring
            .first()
            .ok_or_else(|| CryptoError::InvalidKey("keyring is empty".into()))?;

        let key = Key::<Aes256Gcm>::from_slice(&active.key);
        let cipher = Aes256Gcm::new(key);

        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::DecryptError)?;

        let mut out = Vec::with_capacity(KEY_ID_LEN + NONCE_LEN + ciphertext.len());
        out.push(active.id);
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypts a value previously produced by [`encrypt`](Self::encrypt),
    /// selecting the key by the id prefix.
    pub fn decrypt(&self, sealed: &[u8]) -> Result<String, CryptoError> {
        if sealed.len() < KEY_ID_LEN + NONCE_LEN {
            return Err(CryptoError::Malformed);
        }

        let key_id = sealed[0];
        let (nonce_bytes, ciphertext) = sealed[KEY_ID_LEN..].split_at(NONCE_LEN);

        let entry = self
            .keyring
            .iter()
            .find(|k| k.id == key_id)
            .ok_or(CryptoError::KeyUnknown(key_id))?;

        let key = Key::<Aes256Gcm>::from_slice(&entry.key);
        let cipher = Aes256Gcm::new(key);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::DecryptError)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::Malformed)
    }

    /// Deterministic HMAC-SHA256 blind index over a normalized value,
    /// truncated to a fixed prefix and hex-encoded.
    ///
    /// `normalize` lower-cases and trims so "Alice@Example.com " and
    /// "alice@example.com" index identically.
    pub fn blind_index(&self, value: &str) -> String {
        let normalized = value.trim().to_lowercase();

        let mut mac = Hmac::<Sha256>::new_from_slice(&self.index_key)
            .expect("HMAC accepts any key length");
        mac.update(normalized.as_bytes());
        let digest = mac.finalize().into_bytes();

        hex::encode(&digest[..BLIND_INDEX_LEN])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_box() -> CryptoBox {
        CryptoBox::new(
            1,
            "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef"
                .get(..64)
                .unwrap(),
            "deadbeefcafebabe",
        )
        .unwrap()
    }

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let cb = test_box();
        let sealed = cb.encrypt("user@example.com").unwrap();
        assert_eq!(cb.decrypt(&sealed).unwrap(), "user@example.com");
    }

    #[test]
    fn ciphertext_carries_active_key_id() {
        let cb = test_box();
        let sealed = cb.encrypt("secret").unwrap();
        assert_eq!(sealed[0], 1);
    }

    #[test]
    fn decrypt_rejects_tampered_ciphertext() {
        let cb = test_box();
        let mut sealed = cb.encrypt("secret").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xFF;
        assert!(matches!(cb.decrypt(&sealed), Err(CryptoError::DecryptError)));
    }

    #[test]
    fn decrypt_rejects_unknown_key_id() {
        let cb = test_box();
        let mut sealed = cb.encrypt("secret").unwrap();
        sealed[0] = 99;
        assert!(matches!(cb.decrypt(&sealed), Err(CryptoError::KeyUnknown(99))));
    }

    #[test]
    fn decrypt_rejects_short_input() {
        let cb = test_box();
        assert!(matches!(cb.decrypt(&[1, 2, 3]), Err(CryptoError::Malformed)));
    }

    #[test]
    fn retired_key_still_decrypts() {
        let retired_hex = "fedcba9876543210fedcba9876543210fedcba9876543210fedcba9876543210"
            .get(..64)
            .unwrap();
        let old = CryptoBox::new(7, retired_hex, "deadbeefcafebabe").unwrap();
        let sealed = old.encrypt("legacy value").unwrap();

        let rotated = test_box().with_retired_key(7, retired_hex).unwrap();
        assert_eq!(rotated.decrypt(&sealed).unwrap(), "legacy value");
    }

    #[test]
    fn blind_index_is_deterministic() {
        let cb = test_box();
        assert_eq!(cb.blind_index("user@example.com"), cb.blind_index("user@example.com"));
    }

    #[test]
    fn blind_index_normalizes_case_and_whitespace() {
        let cb = test_box();
        assert_eq!(cb.blind_index(" Alice@Example.com "), cb.blind_index("alice@example.com"));
    }

    #[test]
    fn blind_index_differs_for_different_values() {
        let cb = test_box();
        assert_ne!(cb.blind_index("alice@example.com"), cb.blind_index("bob@example.com"));
    }
}
