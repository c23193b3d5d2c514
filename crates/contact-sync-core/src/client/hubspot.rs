//! HubSpot client (sink).

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ContactSink, ContactSource, Credentials, RestClient};
use crate::error::Result;
use crate::models::{Contact, ContactOrigin};
use crate::normalize::{normalize, normalize_all, RawContact};

/// Public HubSpot API base URL
pub const HUBSPOT_DEFAULT_API_URL: &str = "https://api.hubapi.com";

/// Largest page the contacts list endpoint accepts
pub const HUBSPOT_MAX_PAGE_SIZE: usize = 100;

const CONTACT_PROPERTIES: [&str; 5] = ["email", "firstname", "lastname", "phone", "company"];

/// CRM v3 contacts client.
#[derive(Debug, Clone)]
pub struct HubSpotClient {
    rest: RestClient,
    base_url: String,
}

impl HubSpotClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            rest: RestClient::new(ContactOrigin::HubSpot)?,
            base_url: super::normalize_base_url(base_url)?,
        })
    }

    fn contacts_url(&self) -> String {
        format!("{}/crm/v3/objects/contacts", self.base_url)
    }

    fn contact_url(&self, external_id: &str) -> String {
        format!(
            "{}/crm/v3/objects/contacts/{}",
            self.base_url,
            urlencoding::encode(external_id)
        )
    }

    fn search_url(&self) -> String {
        format!("{}/crm/v3/objects/contacts/search", self.base_url)
    }

    async fn search_by_email(
        &self,
        credentials: &Credentials,
        email: &str,
    ) -> Result<Option<Contact>> {
        let body = json!({
            "filterGroups": [{
                "filters": [{
                    "propertyName": "email",
                    "operator": "EQ",
                    "value": email
                }]
            }],
            "properties": CONTACT_PROPERTIES,
            "limit": 1
        });

        let response: ObjectPage = self
            .rest
            .post_json(&self.search_url(), credentials.access_token(), &body)
            .await?;

        Ok(response
            .results
            .iter()
            .find_map(|object| normalize(ContactOrigin::HubSpot, object.as_raw())))
    }
}

impl ContactSource for HubSpotClient {
    async fn fetch_contacts(
        &self,
        credentials: &Credentials,
        limit: usize,
    ) -> Result<Vec<Contact>> {
        let limit = limit.min(HUBSPOT_MAX_PAGE_SIZE).to_string();
        let properties = CONTACT_PROPERTIES.join(",");

        let response: ObjectPage = self
            .rest
            .get_json(
                &self.contacts_url(),
                credentials.access_token(),
                &[("limit", limit.as_str()), ("properties", properties.as_str())],
            )
            .await?;

        let (contacts, dropped) = normalize_all(
            ContactOrigin::HubSpot,
            response.results.iter().map(HubSpotObject::as_raw),
        );
        tracing::debug!(
            source = "hubspot",
            fetched = contacts.len(),
            dropped_without_email = dropped,
            "Fetched HubSpot contacts"
        );
        Ok(contacts)
    }
}

impl ContactSink for HubSpotClient {
    async fn find_by_email(&self, credentials: &Credentials, email: &str) -> Option<Contact> {
        match self.search_by_email(credentials, email).await {
            Ok(found) => found,
            Err(error) => {
                tracing::warn!(
                    source = "hubspot",
                    error = %error,
                    "Contact lookup failed; treating as not found"
                );
                None
            }
        }
    }

    async fn create_contact(
        &self,
        credentials: &Credentials,
        contact: &Contact,
    ) -> Result<String> {
        let created: CreatedObject = self
            .rest
            .post_json(
                &self.contacts_url(),
                credentials.access_token(),
                &PropertiesBody::from_contact(contact),
            )
            .await?;
        Ok(created.id)
    }

    async fn update_contact(
        &self,
        credentials: &Credentials,
        external_id: &str,
        contact: &Contact,
    ) -> Result<()> {
        let _: IgnoredAny = self
            .rest
            .patch_json(
                &self.contact_url(external_id),
                credentials.access_token(),
                &PropertiesBody::from_contact(contact),
            )
            .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ObjectPage {
    #[serde(default)]
    results: Vec<HubSpotObject>,
}

#[derive(Debug, Deserialize)]
struct HubSpotObject {
    id: String,
    #[serde(default)]
    properties: HubSpotProperties,
}

#[derive(Debug, Default, Deserialize)]
struct HubSpotProperties {
    email: Option<String>,
    firstname: Option<String>,
    lastname: Option<String>,
    phone: Option<String>,
    company: Option<String>,
}

impl HubSpotObject {
    fn as_raw(&self) -> RawContact<'_> {
        RawContact {
            source_id: &self.id,
            first_name: self.properties.firstname.as_deref(),
            last_name: self.properties.lastname.as_deref(),
            email: self.properties.email.as_deref(),
            phone: self.properties.phone.as_deref(),
            company: self.properties.company.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedObject {
    id: String,
}

/// Write payload. Empty fields are left out so a write never blanks a value
/// the sink already holds.
#[derive(Debug, Serialize)]
struct PropertiesBody<'a> {
    properties: OutgoingProperties<'a>,
}

#[derive(Debug, Serialize)]
struct OutgoingProperties<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    firstname: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    lastname: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    phone: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    company: &'a str,
}

impl<'a> PropertiesBody<'a> {
    fn from_contact(contact: &'a Contact) -> Self {
        let (firstname, lastname) = contact.name_parts();
        Self {
            properties: OutgoingProperties {
                email: contact.email(),
                firstname,
                lastname,
                phone: contact.phone(),
                company: contact.company(),
            },
        }
    }
}
