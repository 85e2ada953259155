//! rusqlite-backed record store and audit log.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::params;
use tracing::warn;
use uuid::Uuid;

use super::db::Database;
use super::traits::{AuditLog, RecordStore};
use super::types::{AuditAction, AuditContext, AuditEvent, RecordSummary, StoredRecord};
use crate::crypto::{CryptoCodec, EncryptedBlob};
use crate::error::{Result, VaultError};
use crate::registry::IdentityData;

/// Identity record persistence over SQLite.
pub struct SqliteRecordStore {
    db: Arc<Database>,
    codec: Arc<CryptoCodec>,
}

impl SqliteRecordStore {
    pub fn new(db: Arc<Database>, codec: Arc<CryptoCodec>) -> Self {
        Self { db, codec }
    }
}

impl RecordStore for SqliteRecordStore {
    fn upsert(&self, owner_id: Uuid, dni: &str, identity: &IdentityData) -> Result<StoredRecord> {
        let blob = self.codec.encrypt_json(identity)?;
        let now = Utc::now().to_rfc3339();

        let conn = self.db.lock_conn()?;
        // Conflict resolution happens inside SQLite: one statement, no
        // read-then-write. RETURNING reflects the surviving row, so an
        // update keeps the original id and created_at.
        let (id_str, created_str, updated_str): (String, String, String) = conn.query_row(
            r#"
            INSERT INTO dni_records (id, owner_id, dni, ciphertext, iv, auth_tag, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(owner_id, dni) DO UPDATE SET
                ciphertext = excluded.ciphertext,
                iv = excluded.iv,
                auth_tag = excluded.auth_tag,
                updated_at = excluded.updated_at
            RETURNING id, created_at, updated_at
            "#,
            params![
                Uuid::new_v4().to_string(),
                owner_id.to_string(),
                dni,
                blob.ciphertext,
                blob.iv,
                blob.auth_tag,
                now,
                now,
            ],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(StoredRecord {
            id: parse_uuid(&id_str)?,
            owner_id,
            dni: dni.to_string(),
            identity: identity.clone(),
            created_at: parse_timestamp(&created_str)?,
            updated_at: parse_timestamp(&updated_str)?,
        })
    }

    fn get_by_id(&self, owner_id: Uuid, record_id: Uuid) -> Result<StoredRecord> {
        let conn = self.db.lock_conn()?;

        let result = conn.query_row(
            r#"
            SELECT dni, ciphertext, iv, auth_tag, created_at, updated_at
            FROM dni_records
            WHERE id = ? AND owner_id = ?
            "#,
            params![record_id.to_string(), owner_id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Vec<u8>>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        );

        match result {
            Ok((dni, ciphertext, iv, auth_tag, created_str, updated_str)) => {
                let blob = EncryptedBlob {
                    ciphertext,
                    iv,
                    auth_tag,
                };
                let identity: IdentityData = self.codec.decrypt_json(&blob)?;

                Ok(StoredRecord {
                    id: record_id,
                    owner_id,
                    dni,
                    identity,
                    created_at: parse_timestamp(&created_str)?,
                    updated_at: parse_timestamp(&updated_str)?,
                })
            }
            // A row owned by someone else answers exactly like a missing row.
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(VaultError::RecordNotFound(record_id)),
            Err(e) => Err(e.into()),
        }
    }

    fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<RecordSummary>> {
        let conn = self.db.lock_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, dni, ciphertext, iv, auth_tag, created_at
            FROM dni_records
            WHERE owner_id = ?
            ORDER BY created_at DESC
            "#,
        )?;

        let rows = stmt.query_map([owner_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Vec<u8>>(2)?,
                row.get::<_, Vec<u8>>(3)?,
                row.get::<_, Vec<u8>>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut summaries = Vec::new();
        let mut dropped = 0usize;
        for row in rows {
            let (id_str, dni, ciphertext, iv, auth_tag, created_str) = row?;
            let blob = EncryptedBlob {
                ciphertext,
                iv,
                auth_tag,
            };

            match self.codec.decrypt_json::<IdentityData>(&blob) {
                Ok(identity) => summaries.push(RecordSummary {
                    id: parse_uuid(&id_str)?,
                    dni,
                    full_name: identity.full_name,
                    created_at: parse_timestamp(&created_str)?,
                }),
                Err(err) => {
                    dropped += 1;
                    warn!(record_id = %id_str, error = %err, "dropping unreadable record from listing");
                }
            }
        }

        if dropped > 0 {
            warn!(%owner_id, dropped, "listing skipped unreadable records; possible key mismatch");
        }

        Ok(summaries)
    }
}

/// Append-only audit trail over SQLite.
pub struct SqliteAuditLog {
    db: Arc<Database>,
    codec: Arc<CryptoCodec>,
}

impl SqliteAuditLog {
    pub fn new(db: Arc<Database>, codec: Arc<CryptoCodec>) -> Self {
        Self { db, codec }
    }

    fn try_record(&self, owner_id: Uuid, action: AuditAction, context: &AuditContext) -> Result<()> {
        // Each context field gets its own blob (and its own IV).
        let dni_blob = self.codec.encrypt(context.dni.as_bytes())?;
        let ip = context.source_ip.as_deref().unwrap_or("unknown");
        let ip_blob = self.codec.encrypt(ip.as_bytes())?;
        let user_agent = context.user_agent.as_deref().unwrap_or("unknown");
        let user_agent_blob = self.codec.encrypt(user_agent.as_bytes())?;

        let conn = self.db.lock_conn()?;
        conn.execute(
            r#"
            INSERT INTO audit_log (id, owner_id, action, encrypted_dni, encrypted_ip, encrypted_user_agent, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                Uuid::new_v4().to_string(),
                owner_id.to_string(),
                action.as_str(),
                serde_json::to_string(&dni_blob)?,
                serde_json::to_string(&ip_blob)?,
                serde_json::to_string(&user_agent_blob)?,
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Read back and decrypt the audit trail for one owner, newest first.
    ///
    /// This is operational tooling; the write path never depends on it.
    pub fn events_for(&self, owner_id: Uuid) -> Result<Vec<AuditEvent>> {
        let conn = self.db.lock_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, action, encrypted_dni, encrypted_ip, encrypted_user_agent, created_at
            FROM audit_log
            WHERE owner_id = ?
            ORDER BY created_at DESC
            "#,
        )?;

        let rows = stmt.query_map([owner_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id_str, action, dni_raw, ip_raw, user_agent_raw, created_str) = row?;
            events.push(AuditEvent {
                id: parse_uuid(&id_str)?,
                owner_id,
                action,
                dni: self.decrypt_field(&dni_raw)?,
                source_ip: self.decrypt_field(&ip_raw)?,
                user_agent: self.decrypt_field(&user_agent_raw)?,
                created_at: parse_timestamp(&created_str)?,
            });
        }

        Ok(events)
    }

    fn decrypt_field(&self, raw: &str) -> Result<String> {
        let blob: EncryptedBlob = serde_json::from_str(raw)?;
        let bytes = self.codec.decrypt(&blob)?;
        String::from_utf8(bytes)
            .map_err(|_| VaultError::Storage("audit field is not valid UTF-8".to_string()))
    }
}

impl AuditLog for SqliteAuditLog {
    fn record(&self, owner_id: Uuid, action: AuditAction, context: &AuditContext) {
        if let Err(err) = self.try_record(owner_id, action, context) {
            warn!(%owner_id, action = action.as_str(), error = %err, "audit write failed; continuing");
        }
    }
}

fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| VaultError::Storage(format!("Invalid UUID: {}", e)))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|e| VaultError::Storage(format!("Invalid timestamp: {}", e)))
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{EncryptionKey, KEY_LENGTH};

    fn test_stores() -> (Arc<Database>, Arc<CryptoCodec>) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let codec = Arc::new(CryptoCodec::new(EncryptionKey::from_bytes(
            [0x11; KEY_LENGTH],
        )));
        (db, codec)
    }

    fn context(dni: &str) -> AuditContext {
        AuditContext {
            dni: dni.to_string(),
            source_ip: Some("203.0.113.7".to_string()),
            user_agent: Some("integration-test".to_string()),
        }
    }

    #[test]
    fn test_audit_event_round_trip() {
        let (db, codec) = test_stores();
        let audit = SqliteAuditLog::new(db, codec);
        let owner = Uuid::new_v4();

        audit.record(owner, AuditAction::DniLookup, &context("12345678"));

        let events = audit.events_for(owner).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, "dni_lookup");
        assert_eq!(events[0].dni, "12345678");
        assert_eq!(events[0].source_ip, "203.0.113.7");
        assert_eq!(events[0].user_agent, "integration-test");
    }

    #[test]
    fn test_audit_missing_context_recorded_as_unknown() {
        let (db, codec) = test_stores();
        let audit = SqliteAuditLog::new(db, codec);
        let owner = Uuid::new_v4();

        audit.record(
            owner,
            AuditAction::DniLookup,
            &AuditContext {
                dni: "12345678".to_string(),
                source_ip: None,
                user_agent: None,
            },
        );

        let events = audit.events_for(owner).unwrap();
        assert_eq!(events[0].source_ip, "unknown");
        assert_eq!(events[0].user_agent, "unknown");
    }

    #[test]
    fn test_audit_fields_encrypted_independently() {
        let (db, codec) = test_stores();
        let audit = SqliteAuditLog::new(Arc::clone(&db), codec);
        let owner = Uuid::new_v4();

        audit.record(owner, AuditAction::DniLookup, &context("12345678"));

        let conn = db.lock_conn().unwrap();
        let (dni_raw, ip_raw, ua_raw): (String, String, String) = conn
            .query_row(
                "SELECT encrypted_dni, encrypted_ip, encrypted_user_agent FROM audit_log WHERE owner_id = ?",
                [owner.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();

        // Three distinct blobs with three distinct IVs, no plaintext leakage.
        let dni_blob: EncryptedBlob = serde_json::from_str(&dni_raw).unwrap();
        let ip_blob: EncryptedBlob = serde_json::from_str(&ip_raw).unwrap();
        let ua_blob: EncryptedBlob = serde_json::from_str(&ua_raw).unwrap();
        assert_ne!(dni_blob.iv, ip_blob.iv);
        assert_ne!(ip_blob.iv, ua_blob.iv);
        assert!(!dni_raw.contains("12345678"));
        assert!(!ip_raw.contains("203.0.113.7"));
    }

    #[test]
    fn test_audit_write_failure_is_swallowed() {
        let (db, codec) = test_stores();
        let audit = SqliteAuditLog::new(Arc::clone(&db), codec);

        // Sabotage the table: the write must fail internally but must not
        // surface to the caller.
        db.lock_conn()
            .unwrap()
            .execute_batch("DROP TABLE audit_log;")
            .unwrap();

        audit.record(Uuid::new_v4(), AuditAction::DniLookup, &context("12345678"));
    }

    #[test]
    fn test_record_round_trip_through_store() {
        let (db, codec) = test_stores();
        let store = SqliteRecordStore::new(db, codec);
        let owner = Uuid::new_v4();
        let identity = IdentityData {
            dni: "12345678".to_string(),
            given_names: "ANA".to_string(),
            paternal_surname: "PEREZ".to_string(),
            maternal_surname: "LOPEZ".to_string(),
            full_name: "ANA PEREZ LOPEZ".to_string(),
        };

        let stored = store.upsert(owner, "12345678", &identity).unwrap();
        let fetched = store.get_by_id(owner, stored.id).unwrap();

        assert_eq!(fetched.identity, identity);
        assert_eq!(fetched.dni, "12345678");
    }

    #[test]
    fn test_name_fields_not_stored_in_plaintext() {
        let (db, codec) = test_stores();
        let store = SqliteRecordStore::new(Arc::clone(&db), codec);
        let owner = Uuid::new_v4();
        let identity = IdentityData {
            dni: "12345678".to_string(),
            given_names: "ANA".to_string(),
            paternal_surname: "PEREZ".to_string(),
            maternal_surname: "LOPEZ".to_string(),
            full_name: "ANA PEREZ LOPEZ".to_string(),
        };

        store.upsert(owner, "12345678", &identity).unwrap();

        let conn = db.lock_conn().unwrap();
        let ciphertext: Vec<u8> = conn
            .query_row(
                "SELECT ciphertext FROM dni_records WHERE owner_id = ?",
                [owner.to_string()],
                |row| row.get(0),
            )
            .unwrap();

        let haystack = String::from_utf8_lossy(&ciphertext);
        assert!(!haystack.contains("ANA"));
        assert!(!haystack.contains("PEREZ"));
    }
}
