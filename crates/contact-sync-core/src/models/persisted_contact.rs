//! Mirrored contact model

use serde::{Deserialize, Serialize};

/// A contact row mirrored into local storage after it was written to the sink.
///
/// Keyed by `(user_id, email)`; re-syncing the same email overwrites the
/// mutable fields instead of adding a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedContact {
    /// Owner of the sync run that wrote this row
    pub user_id: String,
    /// Match key, as received from the primary CRM
    pub email: String,
    /// Identifier in the sink CRM
    pub source_id: String,
    pub name: String,
    pub phone: String,
    pub company: String,
    /// Last write timestamp (Unix ms)
    pub last_synced: i64,
}
