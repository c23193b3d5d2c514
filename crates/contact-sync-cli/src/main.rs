//! Contact Sync CLI - run Salesforce to HubSpot contact syncs from the terminal
//!
//! Credentials come from the environment (or a `.env` file); run history and
//! mirrored contacts live in a local database.

mod cli;
mod commands;
mod error;


use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::common::resolve_db_path;
use crate::commands::contacts::run_contacts;
use crate::commands::history::run_history;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path)?;

    match cli.command {
        Commands::Run { user, tier, json } => run_sync(&user, tier, json, &db_path).await?,
        Commands::History { user, limit, json } => {
            run_history(&user, limit, json, &db_path).await?;
        }
        Commands::Contacts { user, limit, json } => {
            run_contacts(&user, limit, json, &db_path).await?;
        }
    }

    Ok(())
}

/// Logs go to stderr so `--json` output stays machine-readable.
fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "contact_sync=info".parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
