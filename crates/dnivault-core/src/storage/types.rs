//! Core data types for the storage layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::registry::IdentityData;

/// One identity record, decrypted for the requesting owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Unique identifier for this record
    pub id: Uuid,

    /// The user the record belongs to
    pub owner_id: Uuid,

    /// The document number, as stored in the plaintext index column
    pub dni: String,

    /// Decrypted identity payload
    pub identity: IdentityData,

    /// When this record was first created
    pub created_at: DateTime<Utc>,

    /// Bumped on every repeated lookup of the same document
    pub updated_at: DateTime<Utc>,
}

/// Decrypted listing row for a user's lookup history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSummary {
    pub id: Uuid,
    pub dni: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

/// Actions recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    /// A document lookup against the upstream registry
    DniLookup,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::DniLookup => "dni_lookup",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request context captured alongside each audit event.
///
/// Every field is encrypted independently before it reaches the database.
#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    /// Document number the action concerned
    pub dni: String,

    /// Caller's source address, if the transport knows it
    pub source_ip: Option<String>,

    /// Caller's user agent, if the transport knows it
    pub user_agent: Option<String>,
}

/// One decrypted audit event, as read back by operational tooling.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub action: String,
    pub dni: String,
    pub source_ip: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
}
