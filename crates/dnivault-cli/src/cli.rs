//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(
    name = "dnivault",
    version,
    about = "Encrypted, audited lookups of Peruvian DNI records"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, env = "DNIVAULT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a starter configuration file
    Init(InitArgs),

    /// Look up a DNI against the registry and store the encrypted result
    Consult(ConsultArgs),

    /// Show one stored record, decrypted
    Show(ShowArgs),

    /// List stored records for a user, newest first
    History(HistoryArgs),

    /// Show the decrypted audit trail for a user
    Audit(AuditArgs),
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Generate a fresh 32-byte encryption key and write it into the config
    #[arg(long)]
    pub generate_key: bool,

    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct ConsultArgs {
    /// 8-digit document number to look up
    pub dni: String,

    /// Authenticated user id, as established by the calling system
    #[arg(long)]
    pub user: Option<Uuid>,

    /// Source address recorded in the audit trail
    #[arg(long)]
    pub source_ip: Option<String>,

    /// User agent recorded in the audit trail
    #[arg(long)]
    pub user_agent: Option<String>,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Record id to fetch
    pub record_id: Uuid,

    /// Authenticated user id the record must belong to
    #[arg(long)]
    pub user: Uuid,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Authenticated user id whose records to list
    #[arg(long)]
    pub user: Uuid,
}

#[derive(Debug, Args)]
pub struct AuditArgs {
    /// User id whose audit trail to show
    #[arg(long)]
    pub user: Uuid,
}
