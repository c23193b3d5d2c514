use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use contact_sync_core::Tier;

#[derive(Parser)]
#[command(name = "contact-sync")]
#[command(about = "Reconcile Salesforce contacts into HubSpot")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH", env = "CONTACT_SYNC_DB_PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute one sync run
    Run {
        /// User the run is recorded for
        #[arg(long, value_name = "ID")]
        user: String,
        /// Entitlement tier
        #[arg(long, value_enum, default_value_t = TierArg::Full)]
        tier: TierArg,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recent sync runs
    History {
        /// User whose runs to show
        #[arg(long, value_name = "ID")]
        user: String,
        /// Number of runs to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List contacts mirrored by past runs
    Contacts {
        /// User whose contacts to show
        #[arg(long, value_name = "ID")]
        user: String,
        /// Number of contacts to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum TierArg {
    Full,
    Limited,
}

impl From<TierArg> for Tier {
    fn from(value: TierArg) -> Self {
        match value {
            TierArg::Full => Self::Full,
            TierArg::Limited => Self::Limited,
        }
    }
}
