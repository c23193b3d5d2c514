//! Salesforce client (primary source).

use serde::Deserialize;

use super::{ContactSource, Credentials, RestClient};
use crate::error::{CredentialSide, Error, Result};
use crate::models::{Contact, ContactOrigin};
use crate::normalize::{normalize_all, RawContact};

/// REST API version used when none is configured
pub const SALESFORCE_DEFAULT_API_VERSION: &str = "v59.0";

/// Reads contacts through the SOQL query endpoint of a tenant instance.
#[derive(Debug, Clone)]
pub struct SalesforceClient {
    rest: RestClient,
    api_version: String,
}

impl SalesforceClient {
    pub fn new(api_version: impl Into<String>) -> Result<Self> {
        let api_version = api_version.into().trim().to_string();
        if !api_version.starts_with('v') {
            return Err(Error::InvalidInput(format!(
                "Salesforce API version must look like v59.0, got '{api_version}'"
            )));
        }
        Ok(Self {
            rest: RestClient::new(ContactOrigin::Salesforce)?,
            api_version,
        })
    }

    fn query_url(&self, instance_url: &str) -> Result<String> {
        let base = super::normalize_base_url(instance_url)?;
        Ok(format!("{base}/services/data/{}/query", self.api_version))
    }
}

/// SOQL for the contact fetch. The row cap lives in the query itself.
pub fn contact_query(limit: usize) -> String {
    format!(
        "SELECT Id, FirstName, LastName, Email, Phone, Account.Name \
         FROM Contact ORDER BY LastModifiedDate DESC LIMIT {limit}"
    )
}

impl ContactSource for SalesforceClient {
    async fn fetch_contacts(
        &self,
        credentials: &Credentials,
        limit: usize,
    ) -> Result<Vec<Contact>> {
        let instance_url = credentials
            .instance_url()
            .ok_or(Error::MissingCredentials(CredentialSide::Primary))?;
        let url = self.query_url(instance_url)?;
        let soql = contact_query(limit);

        let response: QueryResponse = self
            .rest
            .get_json(&url, credentials.access_token(), &[("q", soql.as_str())])
            .await?;

        let (contacts, dropped) = normalize_all(
            ContactOrigin::Salesforce,
            response.records.iter().map(SalesforceContact::as_raw),
        );
        tracing::debug!(
            source = "salesforce",
            fetched = contacts.len(),
            dropped_without_email = dropped,
            total_size = response.total_size,
            "Fetched Salesforce contacts"
        );
        Ok(contacts)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    total_size: u64,
    #[serde(default)]
    records: Vec<SalesforceContact>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SalesforceContact {
    id: String,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    account: Option<SalesforceAccount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SalesforceAccount {
    name: Option<String>,
}

impl SalesforceContact {
    fn as_raw(&self) -> RawContact<'_> {
        RawContact {
            source_id: &self.id,
            first_name: self.first_name.as_deref(),
            last_name: self.last_name.as_deref(),
            email: self.email.as_deref(),
            phone: self.phone.as_deref(),
            company: self
                .account
                .as_ref()
                .and_then(|account| account.name.as_deref()),
        }
    }
}
