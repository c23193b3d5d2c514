//! Maps CRM-specific record shapes into [`Contact`].

use crate::models::{Contact, ContactOrigin};

/// Borrowed view over one raw CRM record.
///
/// Each client maps its wire type into this shape; absent fields are `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawContact<'a> {
    pub source_id: &'a str,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub company: Option<&'a str>,
}

/// Normalize a raw record.
///
/// Returns `None` when the record has no usable email; such records never
/// take part in matching.
pub fn normalize(origin: ContactOrigin, raw: RawContact<'_>) -> Option<Contact> {
    let email = raw.email.map(str::trim).filter(|email| !email.is_empty())?;

    Some(
        Contact::new(origin, raw.source_id.trim(), email)
            .with_name(join_name(raw.first_name, raw.last_name))
            .with_phone(trimmed_or_empty(raw.phone))
            .with_company(trimmed_or_empty(raw.company)),
    )
}

/// Normalize a batch, dropping records without email.
///
/// Returns the contacts and how many records were dropped.
pub fn normalize_all<'a>(
    origin: ContactOrigin,
    records: impl IntoIterator<Item = RawContact<'a>>,
) -> (Vec<Contact>, usize) {
    let mut dropped = 0usize;
    let contacts = records
        .into_iter()
        .filter_map(|raw| {
            let contact = normalize(origin, raw);
            if contact.is_none() {
                dropped += 1;
            }
            contact
        })
        .collect();
    (contacts, dropped)
}

fn join_name(first: Option<&str>, last: Option<&str>) -> String {
    format!("{} {}", first.unwrap_or_default(), last.unwrap_or_default())
        .trim()
        .to_string()
}

fn trimmed_or_empty(value: Option<&str>) -> String {
    value.unwrap_or_default().trim().to_string()
}
