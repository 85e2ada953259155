//! SQLite database handle and schema.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::error::{Result, VaultError};

/// Schema, applied idempotently on open.
///
/// The `UNIQUE(owner_id, dni)` constraint is what makes the record upsert a
/// single atomic conflict-resolved write.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS dni_records (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    dni TEXT NOT NULL,
    ciphertext BLOB NOT NULL,
    iv BLOB NOT NULL,
    auth_tag BLOB NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    UNIQUE(owner_id, dni)
);

CREATE INDEX IF NOT EXISTS dni_records_owner ON dni_records(owner_id);

CREATE TABLE IF NOT EXISTS audit_log (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    action TEXT NOT NULL,
    encrypted_dni TEXT NOT NULL,
    encrypted_ip TEXT NOT NULL,
    encrypted_user_agent TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS audit_log_owner ON audit_log(owner_id);
"#;

/// Shared handle to the SQLite database.
///
/// Access is serialized through a single connection; the stores clone an
/// `Arc<Database>` and lock per operation.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database file and apply the schema.
    pub fn open(path: &Path) -> Result<Self> {
        Self::initialize(Connection::open(path)?)
    }

    /// Open an in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Lock the connection, returning an error if the mutex is poisoned.
    pub(crate) fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| VaultError::Storage("SQLite connection poisoned".to_string()))
    }
}
