//! Error types for dnivault core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the calling layer (CLI, HTTP
//! handler) maps these to transport-appropriate responses.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for dnivault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

/// Core error type for dnivault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Missing or invalid configuration at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid caller input; never retried
    #[error("Validation error: {0}")]
    Validation(String),

    /// No authenticated principal was supplied with the request
    #[error("Authenticated principal required")]
    MissingPrincipal,

    /// The registry has no record for the requested document
    #[error("Document {0} not found in the registry")]
    DocumentNotFound(String),

    /// Our own registry credential was rejected (operator-facing fault)
    #[error("Registry credential rejected (HTTP {0})")]
    UpstreamAuth(u16),

    /// Registry unavailable or misbehaving, after retries where applicable
    #[error("Registry error: {0}")]
    Upstream(String),

    /// Stored record not found, or owned by another user (indistinguishable)
    #[error("Record {0} not found")]
    RecordNotFound(Uuid),

    /// Ciphertext unreadable: tampered data or wrong key (indistinguishable)
    #[error("Decryption failed: data corrupted or key mismatch")]
    Decryption,

    /// Encryption-side failure
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Storage backend error (generic)
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite-specific storage error
    #[error("SQLite error: {source}")]
    Sqlite {
        #[from]
        source: rusqlite::Error,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}
