//! Static encryption key handling.
//!
//! The key is supplied once at process start as a hex-encoded string and
//! held in memory for the process lifetime. Parsing is strict: anything
//! other than exactly 64 hex characters is a fatal configuration error.

use zeroize::ZeroizeOnDrop;

use crate::error::{Result, VaultError};

/// Length of the symmetric key in bytes (32 bytes = 256 bits for AES-256).
pub const KEY_LENGTH: usize = 32;

/// The process-wide symmetric encryption key.
///
/// This type ensures that key material is securely zeroized from memory
/// when dropped, reducing the window of exposure.
#[derive(Clone, ZeroizeOnDrop)]
pub struct EncryptionKey {
    /// The raw key bytes (zeroized on drop)
    key: [u8; KEY_LENGTH],
}

impl EncryptionKey {
    /// Parse a key from its hex-encoded configuration form.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Config` if the string is empty, not valid hex,
    /// or does not decode to exactly [`KEY_LENGTH`] bytes. There is no
    /// fallback: a missing key must abort startup, never be replaced by a
    /// generated one.
    pub fn from_hex(encoded: &str) -> Result<Self> {
        let trimmed = encoded.trim();
        if trimmed.is_empty() {
            return Err(VaultError::Config(
                "Encryption key is not set".to_string(),
            ));
        }

        let bytes = hex::decode(trimmed).map_err(|_| {
            VaultError::Config("Encryption key must be hex-encoded".to_string())
        })?;

        let key: [u8; KEY_LENGTH] = bytes.try_into().map_err(|_| {
            VaultError::Config(format!(
                "Encryption key must be {} bytes ({} hex characters)",
                KEY_LENGTH,
                KEY_LENGTH * 2
            ))
        })?;

        Ok(Self { key })
    }

    /// Create a key from raw bytes.
    ///
    /// # Security
    ///
    /// The caller is responsible for ensuring the bytes come from a secure
    /// source.
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self { key: bytes }
    }

    /// Get a reference to the raw key bytes.
    ///
    /// # Security
    ///
    /// Avoid storing or logging this value. Use only for immediate
    /// encryption operations.
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
