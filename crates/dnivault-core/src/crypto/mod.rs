//! Cryptographic operations for dnivault.
//!
//! This module provides the authenticated-encryption codec used for all
//! personally-identifiable data stored by the record store and the audit
//! trail:
//! - **AES-256-GCM**: authenticated encryption with a fresh random IV per
//!   call and a detached 16-byte authentication tag
//! - Key material zeroized from memory on drop
//!
//! ## Security Model
//!
//! - A single static 256-bit key is supplied once at process start from
//!   configuration; there is deliberately no fallback key generation, since
//!   a throwaway key would make previously-stored ciphertext unrecoverable
//!   after a restart.
//! - Tampering with ciphertext, IV, or tag makes decryption fail; a wrong
//!   key fails the same way, and callers cannot tell the two apart.
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of the database file (fields are unreadable without the key)
//! - Silent modification of stored ciphertext
//!
//! We do NOT defend against:
//! - Compromise of the running process or its configured key
//! - Traffic analysis of the plaintext lookup key column

pub mod codec;
pub mod key;

pub use codec::{CryptoCodec, EncryptedBlob, IV_LENGTH, TAG_LENGTH};
pub use key::{EncryptionKey, KEY_LENGTH};
