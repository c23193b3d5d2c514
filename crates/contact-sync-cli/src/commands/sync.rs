use std::path::Path;

use contact_sync_core::client::{HubSpotClient, PacedSink, SalesforceClient};
use contact_sync_core::config::{CallerCredentials, SyncConfig};
use contact_sync_core::db::{Database, LibSqlContactRepository, LibSqlSyncRunRepository};
use contact_sync_core::SyncEngine;

use crate::cli::TierArg;
use crate::commands::common::{build_request, format_summary_lines, normalize_user_id};
use crate::error::CliError;

pub async fn run_sync(
    user: &str,
    tier: TierArg,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let user = normalize_user_id(user)?;
    let config = SyncConfig::from_env()?;
    let credentials = CallerCredentials::from_env()?;

    let db = Database::open(db_path).await?;
    let primary = SalesforceClient::new(&config.salesforce_api_version)?;
    let sink = PacedSink::new(
        HubSpotClient::new(&config.hubspot_api_url)?,
        config.write_interval,
    );

    let engine = SyncEngine::new(primary, sink, LibSqlSyncRunRepository::new(db.connection()))
        .with_policy(config.policy())
        .with_contact_store(LibSqlContactRepository::new(db.connection()));

    let request = build_request(user, tier.into(), credentials);
    let summary = engine.run(&request).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for line in format_summary_lines(&summary) {
            println!("{line}");
        }
    }

    Ok(())
}
