//! Mirrored contact repository

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT

use libsql::{Connection, Row};

use crate::error::Result;
use crate::models::{Contact, PersistedContact};
use crate::util::unix_millis_now;

/// Local copy of contacts that reached the sink.
#[allow(async_fn_in_trait)]
pub trait ContactStore {
    /// Insert or overwrite the row for `(user_id, contact.email())`.
    /// `sink_id` is the contact's identifier in the sink CRM.
    async fn upsert(&self, user_id: &str, sink_id: &str, contact: &Contact) -> Result<()>;
}

/// Store that keeps nothing. Used when no mirror is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardContacts;

impl ContactStore for DiscardContacts {
    async fn upsert(&self, _user_id: &str, _sink_id: &str, _contact: &Contact) -> Result<()> {
        Ok(())
    }
}

/// libSQL implementation of `ContactStore`
pub struct LibSqlContactRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlContactRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Mirrored contacts for a user, most recently synced first
    pub async fn list(&self, user_id: &str, limit: usize) -> Result<Vec<PersistedContact>> {
        let mut rows = self
            .conn
            .query(
                "SELECT user_id, email, source_id, name, phone, company, last_synced
                 FROM contacts
                 WHERE user_id = ?
                 ORDER BY last_synced DESC, email ASC
                 LIMIT ?",
                libsql::params![user_id, limit as i64],
            )
            .await?;

        let mut contacts = Vec::new();
        while let Some(row) = rows.next().await? {
            contacts.push(Self::parse_contact(&row)?);
        }
        Ok(contacts)
    }

    pub async fn get(&self, user_id: &str, email: &str) -> Result<Option<PersistedContact>> {
        let mut rows = self
            .conn
            .query(
                "SELECT user_id, email, source_id, name, phone, company, last_synced
                 FROM contacts
                 WHERE user_id = ? AND email = ?",
                libsql::params![user_id, email],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_contact(&row)?)),
            None => Ok(None),
        }
    }

    fn parse_contact(row: &Row) -> Result<PersistedContact> {
        Ok(PersistedContact {
            user_id: row.get(0)?,
            email: row.get(1)?,
            source_id: row.get(2)?,
            name: row.get(3)?,
            phone: row.get(4)?,
            company: row.get(5)?,
            last_synced: row.get(6)?,
        })
    }
}

impl ContactStore for LibSqlContactRepository<'_> {
    async fn upsert(&self, user_id: &str, sink_id: &str, contact: &Contact) -> Result<()> {
        // source_id is fixed by the first write; only the mutable fields move
        self.conn
            .execute(
                "INSERT INTO contacts (user_id, email, source_id, name, phone, company, last_synced)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(user_id, email) DO UPDATE SET
                     name = excluded.name,
                     phone = excluded.phone,
                     company = excluded.company,
                     last_synced = excluded.last_synced",
                libsql::params![
                    user_id,
                    contact.email(),
                    sink_id,
                    contact.name(),
                    contact.phone(),
                    contact.company(),
                    unix_millis_now()
                ],
            )
            .await?;
        Ok(())
    }
}
