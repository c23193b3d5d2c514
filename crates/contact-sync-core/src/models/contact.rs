//! Normalized contact model

use std::fmt;

use serde::{Deserialize, Serialize};

/// CRM a contact was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactOrigin {
    /// Primary (read) side
    Salesforce,
    /// Sink (write) side
    HubSpot,
}

impl ContactOrigin {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Salesforce => "salesforce",
            Self::HubSpot => "hubspot",
        }
    }
}

impl fmt::Display for ContactOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A contact normalized from either CRM.
///
/// Fields are read-only once built. `email` is never empty and keeps the
/// exact casing the CRM returned; it is the only key used for matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    source_id: String,
    email: String,
    name: String,
    phone: String,
    company: String,
    origin: ContactOrigin,
}

impl Contact {
    /// Create a contact with empty name, phone and company.
    ///
    /// Callers outside the normalizer are expected to pass an already trimmed,
    /// non-empty email.
    #[must_use]
    pub fn new(
        origin: ContactOrigin,
        source_id: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            email: email.into(),
            name: String::new(),
            phone: String::new(),
            company: String::new(),
            origin,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    #[must_use]
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub const fn origin(&self) -> ContactOrigin {
        self.origin
    }

    /// Split the display name back into first/last parts for CRMs that store
    /// them separately. Everything after the first space is the last name.
    pub fn name_parts(&self) -> (&str, &str) {
        let name = self.name.trim();
        match name.split_once(' ') {
            Some((first, last)) => (first, last.trim_start()),
            None => (name, ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_builder_sets_fields() {
        let contact = Contact::new(ContactOrigin::Salesforce, "003A", "Ada@Example.com")
            .with_name("Ada Lovelace")
            .with_phone("555-0100")
            .with_company("Analytical Engines");

        assert_eq!(contact.source_id(), "003A");
        assert_eq!(contact.email(), "Ada@Example.com");
        assert_eq!(contact.name(), "Ada Lovelace");
        assert_eq!(contact.phone(), "555-0100");
        assert_eq!(contact.company(), "Analytical Engines");
        assert_eq!(contact.origin(), ContactOrigin::Salesforce);
    }

    #[test]
    fn name_parts_splits_on_first_space() {
        let contact =
            Contact::new(ContactOrigin::HubSpot, "1", "a@b.c").with_name("Mary Ann Evans");
        assert_eq!(contact.name_parts(), ("Mary", "Ann Evans"));

        let single = Contact::new(ContactOrigin::HubSpot, "2", "c@d.e").with_name("Cher");
        assert_eq!(single.name_parts(), ("Cher", ""));

        let empty = Contact::new(ContactOrigin::HubSpot, "3", "e@f.g");
        assert_eq!(empty.name_parts(), ("", ""));
    }

    #[test]
    fn contact_serializes_camel_case() {
        let contact = Contact::new(ContactOrigin::HubSpot, "42", "x@example.com");
        let json = serde_json::to_value(&contact).unwrap();
        assert_eq!(json["sourceId"], "42");
        assert_eq!(json["origin"], "hubspot");
    }
}
