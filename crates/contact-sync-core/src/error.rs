//! Error types for contact-sync-core

use thiserror::Error;

use crate::client::UpstreamError;

/// Result type alias using contact-sync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of a sync a credential belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSide {
    Primary,
    Sink,
}

impl CredentialSide {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Sink => "sink",
        }
    }
}

/// Errors that can occur in contact-sync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// A CRM returned a non-2xx status or the request never completed
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Access token (or tenant URL) missing for one side of the sync
    #[error("Missing {} credentials", .0.label())]
    MissingCredentials(CredentialSide),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Sync run not found
    #[error("Sync run not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
