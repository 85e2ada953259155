//! Lookup orchestration: the use-case entry point.
//!
//! A lookup request moves through validation, the upstream fetch, the
//! encrypted upsert, and the audit write, in that order. Nothing is
//! reported as success unless the record is durably stored; an audit
//! failure, on the other hand, never changes the outcome.

use tracing::info;
use uuid::Uuid;

use crate::error::{Result, VaultError};
use crate::registry::{validate_dni, IdentitySource};
use crate::storage::{AuditAction, AuditContext, AuditLog, RecordStore, RecordSummary, StoredRecord};

/// One inbound lookup request, as assembled by the calling layer.
///
/// The principal is whatever identity the transport has already
/// authenticated; this core never authenticates anyone itself.
#[derive(Debug, Clone)]
pub struct LookupRequest {
    /// Verified principal performing the lookup, if any
    pub principal: Option<Uuid>,

    /// Document number to look up
    pub dni: String,

    /// Caller's source address, recorded in the audit trail
    pub source_ip: Option<String>,

    /// Caller's user agent, recorded in the audit trail
    pub user_agent: Option<String>,
}

/// Orchestrates a lookup across the registry client, the record store,
/// and the audit log.
pub struct LookupService<S, R, A> {
    source: S,
    records: R,
    audit: A,
}

impl<S, R, A> LookupService<S, R, A>
where
    S: IdentitySource,
    R: RecordStore,
    A: AuditLog,
{
    pub fn new(source: S, records: R, audit: A) -> Self {
        Self {
            source,
            records,
            audit,
        }
    }

    /// Perform one lookup: validate, fetch, store encrypted, audit.
    ///
    /// # Errors
    ///
    /// - `VaultError::MissingPrincipal` if no principal was supplied; the
    ///   upstream is not contacted.
    /// - `VaultError::Validation` if the document number is malformed; the
    ///   upstream is not contacted.
    /// - `DocumentNotFound` / `UpstreamAuth` / `Upstream` propagated
    ///   verbatim from the registry client.
    /// - A storage error if the upsert fails — the fetched data is not
    ///   returned in that case.
    pub async fn lookup(&self, request: &LookupRequest) -> Result<StoredRecord> {
        let owner = request.principal.ok_or(VaultError::MissingPrincipal)?;

        let dni = request.dni.trim();
        if !validate_dni(dni) {
            return Err(VaultError::Validation(
                "DNI must be exactly 8 numeric digits".to_string(),
            ));
        }

        let identity = self.source.fetch(dni).await?;
        let record = self.records.upsert(owner, dni, &identity)?;

        // Best effort by contract: the implementation swallows failures.
        self.audit.record(
            owner,
            AuditAction::DniLookup,
            &AuditContext {
                dni: dni.to_string(),
                source_ip: request.source_ip.clone(),
                user_agent: request.user_agent.clone(),
            },
        );

        info!(%owner, dni, record_id = %record.id, "lookup stored");
        Ok(record)
    }

    /// Fetch one stored record for the principal, decrypted.
    pub fn record(&self, owner_id: Uuid, record_id: Uuid) -> Result<StoredRecord> {
        self.records.get_by_id(owner_id, record_id)
    }

    /// The principal's lookup history, most recent first.
    pub fn history(&self, owner_id: Uuid) -> Result<Vec<RecordSummary>> {
        self.records.list_by_owner(owner_id)
    }
}
