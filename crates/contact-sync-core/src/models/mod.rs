//! Data models for Contact Sync

mod contact;
mod persisted_contact;
mod sync_run;

pub use contact::{Contact, ContactOrigin};
pub use persisted_contact::PersistedContact;
pub use sync_run::{RunId, RunStatus, SyncRun};
