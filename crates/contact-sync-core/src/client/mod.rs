//! CRM clients.
//!
//! Both CRMs sit behind the same capability traits: [`ContactSource`] for
//! reading and [`ContactSink`] for the side that receives writes. Access
//! tokens are passed in on every call; clients hold no session state.

mod hubspot;
mod rate_limit;
mod rest;
mod salesforce;

use std::fmt;

use thiserror::Error;

use crate::error::Result;
use crate::models::{Contact, ContactOrigin};

pub use hubspot::{HubSpotClient, HUBSPOT_DEFAULT_API_URL, HUBSPOT_MAX_PAGE_SIZE};
pub use rate_limit::{PacedSink, WriteLimiter};
pub use rest::{normalize_base_url, RestClient};
pub use salesforce::{contact_query, SalesforceClient, SALESFORCE_DEFAULT_API_VERSION};

/// Bearer credentials for one CRM, supplied by the caller per run.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_token: String,
    instance_url: Option<String>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            instance_url: None,
        }
    }

    /// Attach the tenant-specific base URL (Salesforce instance URL).
    #[must_use]
    pub fn with_instance_url(mut self, instance_url: impl Into<String>) -> Self {
        self.instance_url = Some(instance_url.into());
        self
    }

    pub fn access_token(&self) -> &str {
        self.access_token.trim()
    }

    pub fn instance_url(&self) -> Option<&str> {
        self.instance_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// True when the token is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.access_token().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("access_token", &"[REDACTED]")
            .field("instance_url", &self.instance_url)
            .finish()
    }
}

/// A CRM call that returned a non-2xx status or never completed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} request failed with {}: {}", .source_system, status_label(.status), .body)]
pub struct UpstreamError {
    /// CRM that produced the failure
    pub source_system: ContactOrigin,
    /// HTTP status, `None` for transport failures
    pub status: Option<u16>,
    /// Response body or transport error text, kept whole
    pub body: String,
}

impl UpstreamError {
    pub fn http(source_system: ContactOrigin, status: u16, body: impl Into<String>) -> Self {
        Self {
            source_system,
            status: Some(status),
            body: body.into(),
        }
    }

    pub fn transport(source_system: ContactOrigin, error: &impl fmt::Display) -> Self {
        Self {
            source_system,
            status: None,
            body: error.to_string().replace('\n', " ").trim().to_string(),
        }
    }
}

fn status_label(status: &Option<u16>) -> String {
    status.map_or_else(|| "transport error".to_string(), |code| format!("HTTP {code}"))
}

/// Read side of a CRM.
#[allow(async_fn_in_trait)]
pub trait ContactSource {
    /// Fetch at most `limit` contacts. The cap is applied by the remote query.
    async fn fetch_contacts(&self, credentials: &Credentials, limit: usize)
        -> Result<Vec<Contact>>;
}

/// Write side of a CRM.
#[allow(async_fn_in_trait)]
pub trait ContactSink: ContactSource {
    /// Look up a contact by exact email. Failures are logged and reported as
    /// not found so one bad lookup cannot abort a batch.
    async fn find_by_email(&self, credentials: &Credentials, email: &str) -> Option<Contact>;

    /// Called once before a run's write batch.
    async fn start_batch(&self) {}

    /// Create a contact, returning its id in the sink.
    async fn create_contact(&self, credentials: &Credentials, contact: &Contact)
        -> Result<String>;

    /// Overwrite an existing sink contact's fields.
    async fn update_contact(
        &self,
        credentials: &Credentials,
        external_id: &str,
        contact: &Contact,
    ) -> Result<()>;
}
