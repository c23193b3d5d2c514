//! Write pacing for the sink CRM.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

use super::{ContactSink, ContactSource, Credentials};
use crate::error::Result;
use crate::models::Contact;

/// Leaky-bucket limiter that lets one call through per `min_interval`.
///
/// Callers queue on the internal lock, so concurrent acquires are served one
/// at a time and each waits for its own slot.
#[derive(Debug)]
pub struct WriteLimiter {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl WriteLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the next slot opens, then claim it.
    pub async fn acquire(&self) {
        let mut next_slot = self.next_slot.lock().await;
        if let Some(slot) = *next_slot {
            if slot > Instant::now() {
                sleep_until(slot).await;
            }
        }
        *next_slot = Some(Instant::now() + self.min_interval);
    }

    /// Forget the last claimed slot so the next acquire passes immediately.
    pub async fn reset(&self) {
        *self.next_slot.lock().await = None;
    }
}

/// Sink decorator that paces creates and updates through a [`WriteLimiter`].
///
/// Reads (list and lookup) pass straight through. Pacing restarts with each
/// write batch, so no slot carries over from one run to the next.
#[derive(Debug)]
pub struct PacedSink<S> {
    inner: S,
    limiter: WriteLimiter,
}

impl<S> PacedSink<S> {
    pub fn new(inner: S, min_interval: Duration) -> Self {
        Self {
            inner,
            limiter: WriteLimiter::new(min_interval),
        }
    }

    pub const fn inner(&self) -> &S {
        &self.inner
    }

    pub const fn limiter(&self) -> &WriteLimiter {
        &self.limiter
    }
}

impl<S: ContactSource> ContactSource for PacedSink<S> {
    async fn fetch_contacts(
        &self,
        credentials: &Credentials,
        limit: usize,
    ) -> Result<Vec<Contact>> {
        self.inner.fetch_contacts(credentials, limit).await
    }
}

impl<S: ContactSink> ContactSink for PacedSink<S> {
    async fn find_by_email(&self, credentials: &Credentials, email: &str) -> Option<Contact> {
        self.inner.find_by_email(credentials, email).await
    }

    async fn start_batch(&self) {
        self.limiter.reset().await;
        self.inner.start_batch().await;
    }

    async fn create_contact(
        &self,
        credentials: &Credentials,
        contact: &Contact,
    ) -> Result<String> {
        self.limiter.acquire().await;
        self.inner.create_contact(credentials, contact).await
    }

    async fn update_contact(
        &self,
        credentials: &Credentials,
        external_id: &str,
        contact: &Contact,
    ) -> Result<()> {
        self.limiter.acquire().await;
        self.inner
            .update_contact(credentials, external_id, contact)
            .await
    }
}
