//! Caller-facing result of a sync run

use serde::Serialize;

use super::Tier;
use crate::models::{Contact, RunId};
use crate::reconcile::ReconciliationReport;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub run_id: RunId,
    pub tier: Tier,
    /// Primary contacts returned by the fetch
    pub contacts_found: usize,
    pub sample_contacts: Vec<Contact>,
    /// Sink writes tried, successful or not
    pub writes_attempted: usize,
    pub created: usize,
    pub updated: usize,
    pub reconciliation: ReconciliationReport,
    pub message: String,
}

impl SyncSummary {
    /// Successful sink writes in this run.
    pub const fn processed(&self) -> usize {
        self.created + self.updated
    }

    pub const fn failed_writes(&self) -> usize {
        self.writes_attempted.saturating_sub(self.processed())
    }
}

pub(super) fn limited_message(found: usize, shown: usize) -> String {
    format!("Found {found} contacts; showing {shown}. Upgrade to sync contacts to HubSpot.")
}

pub(super) fn no_sink_message(found: usize) -> String {
    format!("Found {found} contacts. Connect HubSpot to sync them.")
}

pub(super) fn full_message(found: usize, created: usize, updated: usize, failed: usize) -> String {
    let mut message =
        format!("Found {found} contacts; created {created} and updated {updated} in HubSpot.");
    if failed > 0 {
        message.push_str(&format!(" {failed} writes failed."));
    }
    message
}
