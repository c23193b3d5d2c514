use std::path::Path;

use contact_sync_core::db::{Database, LibSqlSyncRunRepository, RunLog};
use contact_sync_core::SyncRun;

use crate::commands::common::{
    format_run_lines, normalize_limit, normalize_user_id, run_to_item, RunListItem,
};
use crate::error::CliError;

pub async fn list_runs(user: &str, limit: usize, db_path: &Path) -> Result<Vec<SyncRun>, CliError> {
    let user = normalize_user_id(user)?;
    let limit = normalize_limit(limit)?;

    let db = Database::open(db_path).await?;
    let runs = LibSqlSyncRunRepository::new(db.connection())
        .recent_runs(user, limit)
        .await?;
    Ok(runs)
}

pub async fn run_history(
    user: &str,
    limit: usize,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let runs = list_runs(user, limit, db_path).await?;

    if as_json {
        let json_items = runs.iter().map(run_to_item).collect::<Vec<RunListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if runs.is_empty() {
        println!("No sync runs recorded.");
        return Ok(());
    }

    for line in format_run_lines(&runs) {
        println!("{line}");
    }
    Ok(())
}
