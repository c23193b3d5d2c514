//! Database layer for Contact Sync

mod connection;
mod contact_repository;
mod migrations;
mod run_repository;

pub use connection::Database;
pub use contact_repository::{ContactStore, DiscardContacts, LibSqlContactRepository};
pub use run_repository::{LibSqlSyncRunRepository, PendingRun, RunLog, RunOutcome};
