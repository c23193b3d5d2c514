use std::io;

use contact_sync_core::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] contact_sync_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("User ID cannot be empty")]
    EmptyUserId,
    #[error("Limit must be between 1 and {max}, got {value}")]
    InvalidLimit { value: usize, max: usize },
    #[error("Cannot resolve a data directory; pass --db-path or set CONTACT_SYNC_DB_PATH")]
    NoDataDir,
}
