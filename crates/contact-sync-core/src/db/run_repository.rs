//! Sync run log repository

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT

use libsql::{Connection, Row};

use crate::error::{Error, Result};
use crate::models::{RunId, RunStatus, SyncRun};
use crate::util::unix_millis_now;

/// Handle for a run that has started but not finished.
///
/// Completing a run consumes the handle, so a run reaches a terminal state at
/// most once.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingRun {
    id: RunId,
    user_id: String,
    started_at: i64,
}

impl PendingRun {
    /// Build a handle for a freshly inserted run. Only [`RunLog`]
    /// implementations should call this.
    pub fn new(id: RunId, user_id: impl Into<String>, started_at: i64) -> Self {
        Self {
            id,
            user_id: user_id.into(),
            started_at,
        }
    }

    pub const fn id(&self) -> RunId {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub const fn started_at(&self) -> i64 {
        self.started_at
    }
}

/// Terminal state written when a run finishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    status: RunStatus,
    contacts_processed: u32,
    conflicts_count: u32,
    error_message: Option<String>,
}

impl RunOutcome {
    pub const fn success(contacts_processed: u32, conflicts_count: u32) -> Self {
        Self {
            status: RunStatus::Success,
            contacts_processed,
            conflicts_count,
            error_message: None,
        }
    }

    /// A run that aborted before writing anything.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Error,
            contacts_processed: 0,
            conflicts_count: 0,
            error_message: Some(message.into()),
        }
    }

    pub const fn status(&self) -> RunStatus {
        self.status
    }

    pub const fn contacts_processed(&self) -> u32 {
        self.contacts_processed
    }

    pub const fn conflicts_count(&self) -> u32 {
        self.conflicts_count
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    fn into_run(self, pending: PendingRun, completed_at: i64) -> SyncRun {
        SyncRun {
            id: pending.id,
            user_id: pending.user_id,
            status: self.status,
            contacts_processed: self.contacts_processed,
            conflicts_count: self.conflicts_count,
            error_message: self.error_message,
            started_at: pending.started_at,
            completed_at: Some(completed_at),
        }
    }
}

/// Trait for run log storage operations (async)
#[allow(async_fn_in_trait)]
pub trait RunLog {
    /// Record a new run in the `running` state
    async fn start_run(&self, user_id: &str) -> Result<PendingRun>;

    /// Move a run to its terminal state
    async fn complete_run(&self, run: PendingRun, outcome: RunOutcome) -> Result<SyncRun>;

    /// Most recent runs for a user, newest first
    async fn recent_runs(&self, user_id: &str, limit: usize) -> Result<Vec<SyncRun>>;

    /// Fetch a run by ID
    async fn get_run(&self, id: &RunId) -> Result<Option<SyncRun>>;
}

/// libSQL implementation of `RunLog`
pub struct LibSqlSyncRunRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSyncRunRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_run(row: &Row) -> Result<SyncRun> {
        let id: String = row.get(0)?;
        let status: String = row.get(2)?;
        Ok(SyncRun {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("invalid run id '{id}'")))?,
            user_id: row.get(1)?,
            status: status.parse()?,
            contacts_processed: count_column(row, 3)?,
            conflicts_count: count_column(row, 4)?,
            error_message: row.get(5)?,
            started_at: row.get(6)?,
            completed_at: row.get(7)?,
        })
    }
}

fn count_column(row: &Row, index: i32) -> Result<u32> {
    let value: i64 = row.get(index)?;
    u32::try_from(value).map_err(|_| Error::Database(format!("invalid count {value}")))
}

impl RunLog for LibSqlSyncRunRepository<'_> {
    async fn start_run(&self, user_id: &str) -> Result<PendingRun> {
        let run = PendingRun::new(RunId::new(), user_id, unix_millis_now());

        self.conn
            .execute(
                "INSERT INTO sync_runs
                     (id, user_id, status, contacts_processed, conflicts_count, started_at)
                 VALUES (?, ?, ?, 0, 0, ?)",
                libsql::params![
                    run.id.as_str(),
                    run.user_id.as_str(),
                    RunStatus::Running.as_str(),
                    run.started_at
                ],
            )
            .await?;

        Ok(run)
    }

    async fn complete_run(&self, run: PendingRun, outcome: RunOutcome) -> Result<SyncRun> {
        let completed_at = unix_millis_now();

        let rows = self
            .conn
            .execute(
                "UPDATE sync_runs
                 SET status = ?, contacts_processed = ?, conflicts_count = ?,
                     error_message = ?, completed_at = ?
                 WHERE id = ?",
                libsql::params![
                    outcome.status.as_str(),
                    i64::from(outcome.contacts_processed),
                    i64::from(outcome.conflicts_count),
                    outcome.error_message.clone(),
                    completed_at,
                    run.id.as_str()
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(run.id.to_string()));
        }

        Ok(outcome.into_run(run, completed_at))
    }

    async fn recent_runs(&self, user_id: &str, limit: usize) -> Result<Vec<SyncRun>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, user_id, status, contacts_processed, conflicts_count,
                        error_message, started_at, completed_at
                 FROM sync_runs
                 WHERE user_id = ?
                 ORDER BY started_at DESC, id DESC
                 LIMIT ?",
                libsql::params![user_id, limit as i64],
            )
            .await?;

        let mut runs = Vec::new();
        while let Some(row) = rows.next().await? {
            runs.push(Self::parse_run(&row)?);
        }
        Ok(runs)
    }

    async fn get_run(&self, id: &RunId) -> Result<Option<SyncRun>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, user_id, status, contacts_processed, conflicts_count,
                        error_message, started_at, completed_at
                 FROM sync_runs
                 WHERE id = ?",
                libsql::params![id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_run(&row)?)),
            None => Ok(None),
        }
    }
}
