//! AES-256-GCM encryption for OAuth tokens stored at rest.
//!
//! The key is a 32-byte key provided as a hex-encoded string (64 characters).
//! Ciphertext is `base64(nonce || ciphertext)` so it fits a text column.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::Rng;

use crate::error::{storage_error, Error, ErrorKind, StorageErrorKind};

/// 12-byte nonce size for AES-GCM
const NONCE_SIZE: usize = 12;

/// Token cipher keyed once at startup.
#[derive(Clone)]
pub struct Cipher {
    cipher: Aes256Gcm,
}

impl Cipher {
    /// Create a cipher from a hex-encoded 32-byte key.
    pub fn from_hex(key_hex: &str) -> Result<Self, Error> {
        let bytes = hex::decode(key_hex.trim()).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Storage(StorageErrorKind::EncryptionFailed),
        })?;
        if bytes.len() != 32 {
            return Err(storage_error(
                StorageErrorKind::EncryptionFailed,
                "encryption key must be 32 bytes",
            ));
        }
        let cipher = Aes256Gcm::new_from_slice(&bytes).map_err(|_| {
            storage_error(StorageErrorKind::EncryptionFailed, "invalid encryption key")
        })?;
        Ok(Self { cipher })
    }

    /// Encrypt with a random nonce.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, Error> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| storage_error(StorageErrorKind::EncryptionFailed, "encryption failed"))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend(ciphertext);

        Ok(BASE64.encode(combined))
    }

    /// Decrypt a value produced by [`Cipher::encrypt`].
    pub fn decrypt(&self, ciphertext_b64: &str) -> Result<String, Error> {
        let combined = BASE64.decode(ciphertext_b64).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Storage(StorageErrorKind::DecryptionFailed),
        })?;

        if combined.len() < NONCE_SIZE {
            return Err(storage_error(
                StorageErrorKind::DecryptionFailed,
                "ciphertext shorter than nonce",
            ));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| storage_error(StorageErrorKind::DecryptionFailed, "decryption failed"))?;

        String::from_utf8(plaintext).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Storage(StorageErrorKind::DecryptionFailed),
        })
    }
}
