//! contact-sync-core - Core library for Contact Sync
//!
//! This crate contains the contact models, the Salesforce and HubSpot clients,
//! the reconciler, the sync engine and the run log behind the `contact-sync`
//! CLI.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod normalize;
pub mod reconcile;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Contact, ContactOrigin, SyncRun};
pub use sync::{SyncEngine, SyncRequest, SyncSummary, Tier};
