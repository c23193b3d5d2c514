//! Sync orchestration.
//!
//! A run pulls the primary contact list (and the sink's list in the full
//! tier), reconciles the two, mirrors a bounded batch of primary contacts into
//! the sink, and records the run in the run log.

mod engine;
mod summary;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::client::Credentials;
use crate::error::{CredentialSide, Error, Result};

pub use engine::SyncEngine;
pub use summary::SyncSummary;

/// Entitlement level of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Fetch, reconcile and write to the sink
    Full,
    /// Preview only: a few primary contacts, no writes
    Limited,
}

impl Tier {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Limited => "limited",
        }
    }

    /// Map a caller's entitlement flag to a tier.
    pub const fn for_entitlement(has_full_access: bool) -> Self {
        if has_full_access {
            Self::Full
        } else {
            Self::Limited
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "limited" => Ok(Self::Limited),
            other => Err(Error::InvalidInput(format!("unknown tier '{other}'"))),
        }
    }
}

/// Per-run size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPolicy {
    /// Cap passed to each CRM fetch
    pub primary_fetch_limit: usize,
    /// Most primary contacts written to the sink in one full-tier run
    pub write_batch_limit: usize,
    /// Contacts returned in the summary preview
    pub sample_size: usize,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            primary_fetch_limit: 100,
            write_batch_limit: 10,
            sample_size: 5,
        }
    }
}

/// Input for one sync run. Credentials travel with the request; the engine
/// never reads them from anywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub user_id: String,
    pub tier: Tier,
    pub primary: Option<Credentials>,
    pub sink: Option<Credentials>,
}

impl SyncRequest {
    pub fn new(user_id: impl Into<String>, tier: Tier) -> Self {
        Self {
            user_id: user_id.into(),
            tier,
            primary: None,
            sink: None,
        }
    }

    #[must_use]
    pub fn with_primary(mut self, credentials: Credentials) -> Self {
        self.primary = Some(credentials);
        self
    }

    #[must_use]
    pub fn with_sink(mut self, credentials: Credentials) -> Self {
        self.sink = Some(credentials);
        self
    }

    /// Check preconditions before any network call or run log write.
    ///
    /// Returns the primary credentials and, in the full tier, the sink
    /// credentials when supplied. The limited tier ignores the sink entirely.
    fn validate(&self) -> Result<(&Credentials, Option<&Credentials>)> {
        if self.user_id.trim().is_empty() {
            return Err(Error::InvalidInput("user id must not be empty".to_string()));
        }

        let primary = self
            .primary
            .as_ref()
            .filter(|credentials| !credentials.is_blank())
            .ok_or(Error::MissingCredentials(CredentialSide::Primary))?;

        let sink = match (self.tier, self.sink.as_ref()) {
            (Tier::Limited, _) | (Tier::Full, None) => None,
            (Tier::Full, Some(credentials)) if credentials.is_blank() => {
                return Err(Error::MissingCredentials(CredentialSide::Sink));
            }
            (Tier::Full, Some(credentials)) => Some(credentials),
        };

        Ok((primary, sink))
    }
}
