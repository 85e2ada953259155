//! dnivault CLI - encrypted, audited DNI lookups from the command line.
//!
//! This is the calling layer for the core library: it loads configuration,
//! constructs the services, and maps typed core errors to messages and a
//! non-zero exit code. Authentication happens elsewhere; the acting
//! principal is passed in with `--user`.

mod cli;
mod commands;
mod config;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Init(args) => commands::init(cli.config.as_deref(), args),
        Commands::Consult(args) => commands::consult(cli.config.as_deref(), args).await,
        Commands::Show(args) => commands::show(cli.config.as_deref(), args),
        Commands::History(args) => commands::history(cli.config.as_deref(), args),
        Commands::Audit(args) => commands::audit(cli.config.as_deref(), args),
    }
}
