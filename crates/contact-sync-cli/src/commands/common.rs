use std::path::PathBuf;

use chrono::Utc;
use contact_sync_core::config::CallerCredentials;
use contact_sync_core::models::PersistedContact;
use contact_sync_core::{SyncRequest, SyncRun, SyncSummary, Tier};
use serde::Serialize;

use crate::error::CliError;

/// Upper bound for `--limit` on list commands
pub const MAX_LIST_LIMIT: usize = 500;

#[derive(Debug, Serialize)]
pub struct RunListItem {
    pub id: String,
    pub status: String,
    pub contacts_processed: u32,
    pub conflicts_count: u32,
    pub error_message: Option<String>,
    pub started_at: i64,
    pub started_at_iso: String,
    pub completed_at: Option<i64>,
    pub duration_ms: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ContactListItem {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub company: String,
    pub hubspot_id: String,
    pub last_synced: i64,
    pub relative_time: String,
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    match cli_db_path {
        Some(path) => Ok(path),
        None => default_db_path(),
    }
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("contact-sync").join("contact-sync.db"))
        .ok_or(CliError::NoDataDir)
}

pub fn normalize_user_id(user_id: &str) -> Result<&str, CliError> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyUserId)
    } else {
        Ok(trimmed)
    }
}

pub fn normalize_limit(limit: usize) -> Result<usize, CliError> {
    if limit == 0 || limit > MAX_LIST_LIMIT {
        Err(CliError::InvalidLimit {
            value: limit,
            max: MAX_LIST_LIMIT,
        })
    } else {
        Ok(limit)
    }
}

pub fn build_request(user_id: &str, tier: Tier, credentials: CallerCredentials) -> SyncRequest {
    SyncRequest {
        user_id: user_id.to_string(),
        tier,
        primary: credentials.primary,
        sink: credentials.sink,
    }
}

pub fn format_summary_lines(summary: &SyncSummary) -> Vec<String> {
    let mut lines = vec![
        format!("Run {} ({} tier)", summary.run_id, summary.tier),
        summary.message.clone(),
    ];

    if summary.tier == Tier::Full {
        let report = summary.reconciliation;
        lines.push(format!(
            "Reconciliation: matched={} conflicts={} only_in_salesforce={} only_in_hubspot={}",
            report.matched, report.conflicts, report.only_in_primary, report.only_in_sink
        ));
    }

    if !summary.sample_contacts.is_empty() {
        lines.push("Sample:".to_string());
        for contact in &summary.sample_contacts {
            let name = if contact.name().is_empty() {
                "(no name)"
            } else {
                contact.name()
            };
            if contact.company().is_empty() {
                lines.push(format!("  {name} <{}>", contact.email()));
            } else {
                lines.push(format!("  {name} <{}>  {}", contact.email(), contact.company()));
            }
        }
    }

    lines
}

pub fn run_to_item(run: &SyncRun) -> RunListItem {
    RunListItem {
        id: run.id.to_string(),
        status: run.status.to_string(),
        contacts_processed: run.contacts_processed,
        conflicts_count: run.conflicts_count,
        error_message: run.error_message.clone(),
        started_at: run.started_at,
        started_at_iso: format_timestamp(run.started_at),
        completed_at: run.completed_at,
        duration_ms: run
            .completed_at
            .map(|completed| completed.saturating_sub(run.started_at)),
    }
}

pub fn format_run_lines(runs: &[SyncRun]) -> Vec<String> {
    runs.iter()
        .map(|run| {
            let id = run.id.to_string();
            let short_id = id.chars().take(13).collect::<String>();
            let line = format!(
                "{}  {short_id:<13}  {:<7}  processed={} conflicts={}",
                format_timestamp(run.started_at),
                run.status.as_str(),
                run.contacts_processed,
                run.conflicts_count
            );
            match run.error_message.as_deref() {
                Some(message) => format!("{line}  error={message}"),
                None => line,
            }
        })
        .collect()
}

pub fn contact_to_item(contact: &PersistedContact, now_ms: i64) -> ContactListItem {
    ContactListItem {
        email: contact.email.clone(),
        name: contact.name.clone(),
        phone: contact.phone.clone(),
        company: contact.company.clone(),
        hubspot_id: contact.source_id.clone(),
        last_synced: contact.last_synced,
        relative_time: format_relative_time(contact.last_synced, now_ms),
    }
}

pub fn format_contact_lines(contacts: &[PersistedContact]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    contacts
        .iter()
        .map(|contact| {
            format!(
                "{:<32}  {:<24}  {:<20}  {}",
                contact.email,
                contact.name,
                contact.company,
                format_relative_time(contact.last_synced, now_ms)
            )
        })
        .collect()
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else {
        format!("{}d ago", diff / day)
    }
}
