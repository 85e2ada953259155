//! Command implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use rand::RngCore;

use dnivault_core::crypto::{CryptoCodec, EncryptionKey, KEY_LENGTH};
use dnivault_core::registry::RegistryClient;
use dnivault_core::storage::{Database, RecordStore, SqliteAuditLog, SqliteRecordStore};
use dnivault_core::{LookupRequest, LookupService};

use crate::cli::{AuditArgs, ConsultArgs, HistoryArgs, InitArgs, ShowArgs};
use crate::config::{
    self, default_config_path, default_database_path, read_config, write_config, CliConfig,
};
use crate::output;

pub fn init(config_path: Option<&Path>, args: InitArgs) -> anyhow::Result<()> {
    let path = resolve_config_path(config_path)?;
    if path.exists() && !args.force {
        anyhow::bail!(
            "Config {} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let key_hex = if args.generate_key {
        let mut key = [0u8; KEY_LENGTH];
        rand::thread_rng().fill_bytes(&mut key);
        Some(hex::encode(key))
    } else {
        None
    };

    let generated = key_hex.is_some();
    let starter = CliConfig::starter(default_database_path()?, key_hex);
    write_config(&path, &starter)?;

    println!("Wrote {}", path.display());
    if generated {
        println!("A new encryption key was generated and stored in [crypto].key_hex.");
        println!("Keep it safe: records encrypted with it are unreadable without it.");
    } else {
        println!(
            "Set {} (or [crypto].key_hex) before the first lookup.",
            config::KEY_ENV
        );
    }
    println!(
        "Set {} (or [registry].token) to your registry API token.",
        config::TOKEN_ENV
    );

    Ok(())
}

pub async fn consult(config_path: Option<&Path>, args: ConsultArgs) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let vault = config.vault_config()?;

    let (db, codec) = open_database_at(&vault.database_path, vault.encryption_key)?;
    let client = RegistryClient::new(vault.registry)?;
    let service = LookupService::new(
        client,
        SqliteRecordStore::new(Arc::clone(&db), Arc::clone(&codec)),
        SqliteAuditLog::new(db, codec),
    );

    let record = service
        .lookup(&LookupRequest {
            principal: args.user,
            dni: args.dni,
            source_ip: args.source_ip,
            user_agent: args.user_agent,
        })
        .await?;

    output::print_record(&record);
    Ok(())
}

pub fn show(config_path: Option<&Path>, args: ShowArgs) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let (db, codec) = open_database(&config)?;

    let store = SqliteRecordStore::new(db, codec);
    let record = store.get_by_id(args.user, args.record_id)?;

    output::print_record(&record);
    Ok(())
}

pub fn history(config_path: Option<&Path>, args: HistoryArgs) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let (db, codec) = open_database(&config)?;

    let store = SqliteRecordStore::new(db, codec);
    let records = store.list_by_owner(args.user)?;

    output::print_history(&records);
    Ok(())
}

pub fn audit(config_path: Option<&Path>, args: AuditArgs) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let (db, codec) = open_database(&config)?;

    let audit_log = SqliteAuditLog::new(db, codec);
    let events = audit_log.events_for(args.user)?;

    output::print_audit_events(&events);
    Ok(())
}

fn resolve_config_path(config_path: Option<&Path>) -> anyhow::Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path.to_path_buf()),
        None => default_config_path(),
    }
}

fn load_config(config_path: Option<&Path>) -> anyhow::Result<CliConfig> {
    let path = resolve_config_path(config_path)?;
    read_config(&path).with_context(|| "run `dnivault init` to create a starter config")
}

fn open_database(config: &CliConfig) -> anyhow::Result<(Arc<Database>, Arc<CryptoCodec>)> {
    // Key resolution fails fast before any database file is created.
    let key = config.encryption_key()?;
    open_database_at(&config.vault.database_path, key)
}

fn open_database_at(
    path: &Path,
    key: EncryptionKey,
) -> anyhow::Result<(Arc<Database>, Arc<CryptoCodec>)> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
    }

    let db = Arc::new(Database::open(path)?);
    let codec = Arc::new(CryptoCodec::new(key));
    Ok((db, codec))
}
