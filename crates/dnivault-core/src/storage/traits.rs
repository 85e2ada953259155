//! Storage trait definitions.
//!
//! The orchestrator depends on these seams rather than on the SQLite
//! implementations, so tests can substitute stubs and a different backend
//! can be swapped in without touching the lookup flow.

use uuid::Uuid;

use super::types::{AuditAction, AuditContext, RecordSummary, StoredRecord};
use crate::error::Result;
use crate::registry::IdentityData;

/// Persistence for identity records, one row per `(owner, dni)` pair.
pub trait RecordStore: Send + Sync {
    /// Encrypt `identity` and insert-or-replace the record for
    /// `(owner_id, dni)` in a single atomic write.
    ///
    /// A repeated lookup replaces the encrypted payload and bumps
    /// `updated_at`; it never creates a second row and never exposes a
    /// partially-written state to concurrent readers.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Crypto` if encryption fails, or a storage
    /// error if the write does.
    fn upsert(&self, owner_id: Uuid, dni: &str, identity: &IdentityData) -> Result<StoredRecord>;

    /// Fetch and decrypt one record owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::RecordNotFound` if the row does not exist OR
    /// belongs to a different owner — the two cases are deliberately
    /// indistinguishable. Returns `VaultError::Decryption` if the payload
    /// is unreadable.
    fn get_by_id(&self, owner_id: Uuid, record_id: Uuid) -> Result<StoredRecord>;

    /// List the owner's records, most recent first, each decrypted
    /// individually.
    ///
    /// A record whose payload cannot be decrypted is dropped from the
    /// result (and logged as a data-integrity event) rather than failing
    /// the whole listing.
    fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<RecordSummary>>;
}

/// Append-only audit trail.
pub trait AuditLog: Send + Sync {
    /// Append one audit event for `owner_id`.
    ///
    /// Never fails: audit-trail unavailability must not block the
    /// user-facing operation, so implementations log and swallow internal
    /// errors.
    fn record(&self, owner_id: Uuid, action: AuditAction, context: &AuditContext);
}
