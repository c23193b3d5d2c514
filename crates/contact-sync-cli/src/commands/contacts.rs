use std::path::Path;

use chrono::Utc;
use contact_sync_core::db::{Database, LibSqlContactRepository};
use contact_sync_core::models::PersistedContact;

use crate::commands::common::{
    contact_to_item, format_contact_lines, normalize_limit, normalize_user_id, ContactListItem,
};
use crate::error::CliError;

pub async fn list_contacts(
    user: &str,
    limit: usize,
    db_path: &Path,
) -> Result<Vec<PersistedContact>, CliError> {
    let user = normalize_user_id(user)?;
    let limit = normalize_limit(limit)?;

    let db = Database::open(db_path).await?;
    let contacts = LibSqlContactRepository::new(db.connection())
        .list(user, limit)
        .await?;
    Ok(contacts)
}

pub async fn run_contacts(
    user: &str,
    limit: usize,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let contacts = list_contacts(user, limit, db_path).await?;

    if as_json {
        let now_ms = Utc::now().timestamp_millis();
        let json_items = contacts
            .iter()
            .map(|contact| contact_to_item(contact, now_ms))
            .collect::<Vec<ContactListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if contacts.is_empty() {
        println!("No contacts mirrored yet. Run `contact-sync run --user <id>` first.");
        return Ok(());
    }

    for line in format_contact_lines(&contacts) {
        println!("{line}");
    }
    Ok(())
}
