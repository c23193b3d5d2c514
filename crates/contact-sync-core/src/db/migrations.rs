//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }
    if version < 2 {
        migrate_v2(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Migration to version 1: sync run log
async fn migrate_v1(conn: &Connection) -> Result<()> {
    apply(
        conn,
        1,
        &[
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            "CREATE TABLE IF NOT EXISTS sync_runs (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('running', 'success', 'error')),
                contacts_processed INTEGER NOT NULL DEFAULT 0,
                conflicts_count INTEGER NOT NULL DEFAULT 0,
                error_message TEXT,
                started_at INTEGER NOT NULL,
                completed_at INTEGER
            )",
            "CREATE INDEX IF NOT EXISTS idx_sync_runs_user_started
                ON sync_runs(user_id, started_at DESC)",
            "INSERT INTO schema_version (version) VALUES (1)",
        ],
    )
    .await
}

/// Migration to version 2: mirrored contacts
async fn migrate_v2(conn: &Connection) -> Result<()> {
    apply(
        conn,
        2,
        &[
            "CREATE TABLE IF NOT EXISTS contacts (
                user_id TEXT NOT NULL,
                email TEXT NOT NULL,
                source_id TEXT NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                phone TEXT NOT NULL DEFAULT '',
                company TEXT NOT NULL DEFAULT '',
                last_synced INTEGER NOT NULL,
                PRIMARY KEY (user_id, email)
            )",
            "CREATE INDEX IF NOT EXISTS idx_contacts_last_synced
                ON contacts(user_id, last_synced DESC)",
            "INSERT INTO schema_version (version) VALUES (2)",
        ],
    )
    .await
}

/// Execute statements in one transaction, rolling back on the first failure.
async fn apply(conn: &Connection, version: i32, statements: &[&str]) -> Result<()> {
    // libsql doesn't have execute_batch, so statements run one by one
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    tracing::info!("Migrated database to version {version} (latest {CURRENT_VERSION})");
    Ok(())
}
