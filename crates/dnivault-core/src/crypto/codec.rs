//! AES-256-GCM encryption and decryption of structured data.
//!
//! Every sensitive field stored by dnivault passes through this codec. The
//! output carries the ciphertext, the per-call random IV, and the GCM
//! authentication tag as three separate byte strings, so tampering with any
//! of them is detected at decryption time.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::crypto::key::EncryptionKey;
use crate::error::{Result, VaultError};

/// Length of the per-call initialization vector in bytes.
pub const IV_LENGTH: usize = 16;

/// Length of the GCM authentication tag in bytes.
pub const TAG_LENGTH: usize = 16;

/// AES-256-GCM parameterized with a 16-byte nonce, matching the stored
/// blob format (16-byte IV alongside a 16-byte detached tag).
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// An encrypted value as persisted at rest.
///
/// Serialized with hex-encoded fields; this is the JSON shape written into
/// audit columns. The authentication tag covers the ciphertext and the IV,
/// so altering any field makes decryption fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBlob {
    #[serde(with = "hex::serde")]
    pub ciphertext: Vec<u8>,

    #[serde(with = "hex::serde")]
    pub iv: Vec<u8>,

    #[serde(with = "hex::serde")]
    pub auth_tag: Vec<u8>,
}

/// Authenticated-encryption codec bound to the process-wide key.
///
/// Construct one at startup and share it; it holds no other state and all
/// operations are CPU-bound.
pub struct CryptoCodec {
    key: EncryptionKey,
}

impl CryptoCodec {
    /// Create a codec from an already-validated key.
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    /// Encrypt arbitrary bytes with a fresh random IV.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Crypto` on an internal AEAD failure (should be
    /// unreachable with a valid key).
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedBlob> {
        let mut iv = [0u8; IV_LENGTH];
        rand::thread_rng().fill_bytes(&mut iv);

        let cipher = Aes256Gcm16::new_from_slice(self.key.as_bytes())
            .map_err(|_| VaultError::Crypto("invalid key length".to_string()))?;

        let nonce = Nonce::<U16>::from_slice(&iv);
        let mut sealed = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| VaultError::Crypto("encryption failed".to_string()))?;

        // The aead API appends the tag to the ciphertext; store it detached.
        let auth_tag = sealed.split_off(sealed.len() - TAG_LENGTH);

        Ok(EncryptedBlob {
            ciphertext: sealed,
            iv: iv.to_vec(),
            auth_tag,
        })
    }

    /// Decrypt a blob produced by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Decryption` if the tag does not verify — a
    /// tampered ciphertext/IV/tag and a wrong key are indistinguishable to
    /// the caller.
    pub fn decrypt(&self, blob: &EncryptedBlob) -> Result<Vec<u8>> {
        if blob.iv.len() != IV_LENGTH || blob.auth_tag.len() != TAG_LENGTH {
            return Err(VaultError::Decryption);
        }

        let cipher = Aes256Gcm16::new_from_slice(self.key.as_bytes())
            .map_err(|_| VaultError::Decryption)?;

        let nonce = Nonce::<U16>::from_slice(&blob.iv);
        let mut sealed = Vec::with_capacity(blob.ciphertext.len() + TAG_LENGTH);
        sealed.extend_from_slice(&blob.ciphertext);
        sealed.extend_from_slice(&blob.auth_tag);

        cipher
            .decrypt(nonce, sealed.as_slice())
            .map_err(|_| VaultError::Decryption)
    }

    /// Serialize a value to JSON and encrypt it.
    pub fn encrypt_json<T: Serialize>(&self, value: &T) -> Result<EncryptedBlob> {
        let json = serde_json::to_vec(value)?;
        self.encrypt(&json)
    }

    /// Decrypt a blob and deserialize the plaintext from JSON.
    pub fn decrypt_json<T: DeserializeOwned>(&self, blob: &EncryptedBlob) -> Result<T> {
        let plaintext = self.decrypt(blob)?;
        Ok(serde_json::from_slice(&plaintext)?)
    }
}
