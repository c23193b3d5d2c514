//! Sync orchestrator

use crate::client::{ContactSink, ContactSource, Credentials};
use crate::db::{ContactStore, DiscardContacts, PendingRun, RunLog, RunOutcome};
use crate::error::Result;
use crate::models::Contact;
use crate::reconcile::{reconcile, ReconciliationReport};
use crate::util::user_fingerprint;

use super::summary::{full_message, limited_message, no_sink_message};
use super::{SyncPolicy, SyncRequest, SyncSummary, Tier};

/// Runs syncs from a primary source into a sink, recording each run.
///
/// Pacing of sink writes belongs to the sink (see
/// [`PacedSink`](crate::client::PacedSink)); the engine issues writes one
/// after another and never sleeps itself.
pub struct SyncEngine<P, S, L, C = DiscardContacts> {
    primary: P,
    sink: S,
    runs: L,
    contacts: C,
    policy: SyncPolicy,
}

/// What a run produced before it is written to the run log.
struct RunReport {
    contacts_found: usize,
    sample_contacts: Vec<Contact>,
    writes_attempted: usize,
    created: usize,
    updated: usize,
    reconciliation: ReconciliationReport,
    message: String,
}

#[derive(Default)]
struct WriteTally {
    attempted: usize,
    created: usize,
    updated: usize,
}

impl<P, S, L> SyncEngine<P, S, L> {
    pub fn new(primary: P, sink: S, runs: L) -> Self {
        Self {
            primary,
            sink,
            runs,
            contacts: DiscardContacts,
            policy: SyncPolicy::default(),
        }
    }
}

impl<P, S, L, C> SyncEngine<P, S, L, C> {
    #[must_use]
    pub fn with_policy(mut self, policy: SyncPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Mirror every successful sink write into `contacts`.
    pub fn with_contact_store<D>(self, contacts: D) -> SyncEngine<P, S, L, D> {
        SyncEngine {
            primary: self.primary,
            sink: self.sink,
            runs: self.runs,
            contacts,
            policy: self.policy,
        }
    }

    pub const fn policy(&self) -> SyncPolicy {
        self.policy
    }

    pub const fn sink(&self) -> &S {
        &self.sink
    }

    pub const fn run_log(&self) -> &L {
        &self.runs
    }
}

impl<P, S, L, C> SyncEngine<P, S, L, C>
where
    P: ContactSource,
    S: ContactSink,
    L: RunLog,
    C: ContactStore,
{
    /// Execute one run.
    ///
    /// Credential problems fail before anything is recorded. Once the run is
    /// logged, a fetch failure marks it `error` and is returned to the caller;
    /// individual write failures are logged and skipped.
    pub async fn run(&self, request: &SyncRequest) -> Result<SyncSummary> {
        let (primary, sink) = request.validate()?;
        let user = user_fingerprint(&request.user_id);

        let pending = self.runs.start_run(&request.user_id).await?;
        let run_id = pending.id();
        tracing::info!(
            user,
            run_id = %run_id,
            tier = request.tier.as_str(),
            sink = sink.is_some(),
            "Sync run started"
        );

        let result = match request.tier {
            Tier::Full => self.run_full(&request.user_id, primary, sink).await,
            Tier::Limited => self.run_limited(primary).await,
        };

        match result {
            Ok(report) => {
                let processed = count(report.created + report.updated);
                let conflicts = report.reconciliation.conflicts;
                if let Err(error) = self
                    .runs
                    .complete_run(pending, RunOutcome::success(processed, conflicts))
                    .await
                {
                    tracing::error!(
                        user,
                        run_id = %run_id,
                        error = %error,
                        "Failed to record sync run completion"
                    );
                    return Err(error);
                }

                tracing::info!(
                    user,
                    run_id = %run_id,
                    found = report.contacts_found,
                    attempted = report.writes_attempted,
                    created = report.created,
                    updated = report.updated,
                    conflicts,
                    "Sync run finished"
                );

                Ok(SyncSummary {
                    run_id,
                    tier: request.tier,
                    contacts_found: report.contacts_found,
                    sample_contacts: report.sample_contacts,
                    writes_attempted: report.writes_attempted,
                    created: report.created,
                    updated: report.updated,
                    reconciliation: report.reconciliation,
                    message: report.message,
                })
            }
            Err(error) => {
                tracing::warn!(user, run_id = %run_id, error = %error, "Sync run failed");
                self.record_failure(pending, &error.to_string()).await;
                Err(error)
            }
        }
    }

    async fn record_failure(&self, pending: PendingRun, message: &str) {
        let run_id = pending.id();
        if let Err(log_error) = self
            .runs
            .complete_run(pending, RunOutcome::failure(message))
            .await
        {
            tracing::error!(
                run_id = %run_id,
                error = %log_error,
                "Failed to record sync run failure"
            );
        }
    }

    async fn run_limited(&self, primary: &Credentials) -> Result<RunReport> {
        let fetched = self
            .primary
            .fetch_contacts(primary, self.policy.primary_fetch_limit)
            .await?;

        let contacts_found = fetched.len();
        let sample_contacts: Vec<Contact> =
            fetched.into_iter().take(self.policy.sample_size).collect();

        Ok(RunReport {
            contacts_found,
            message: limited_message(contacts_found, sample_contacts.len()),
            sample_contacts,
            writes_attempted: 0,
            created: 0,
            updated: 0,
            reconciliation: ReconciliationReport::default(),
        })
    }

    async fn run_full(
        &self,
        user_id: &str,
        primary: &Credentials,
        sink: Option<&Credentials>,
    ) -> Result<RunReport> {
        let limit = self.policy.primary_fetch_limit;

        let (primary_contacts, sink_contacts) = match sink {
            Some(sink) => {
                tokio::try_join!(
                    self.primary.fetch_contacts(primary, limit),
                    self.sink.fetch_contacts(sink, limit),
                )?
            }
            None => (self.primary.fetch_contacts(primary, limit).await?, Vec::new()),
        };

        let reconciliation = reconcile(&primary_contacts, &sink_contacts).report();
        tracing::debug!(
            only_in_primary = reconciliation.only_in_primary,
            only_in_sink = reconciliation.only_in_sink,
            matched = reconciliation.matched,
            conflicts = reconciliation.conflicts,
            "Reconciled contact lists"
        );

        let tally = match sink {
            Some(sink) => self.write_batch(user_id, sink, &primary_contacts).await,
            None => WriteTally::default(),
        };

        let contacts_found = primary_contacts.len();
        let message = if sink.is_some() {
            full_message(
                contacts_found,
                tally.created,
                tally.updated,
                tally.attempted - tally.created - tally.updated,
            )
        } else {
            no_sink_message(contacts_found)
        };

        Ok(RunReport {
            contacts_found,
            sample_contacts: primary_contacts
                .into_iter()
                .take(self.policy.sample_size)
                .collect(),
            writes_attempted: tally.attempted,
            created: tally.created,
            updated: tally.updated,
            reconciliation,
            message,
        })
    }

    /// Push the first `write_batch_limit` primary contacts to the sink, one
    /// at a time.
    async fn write_batch(
        &self,
        user_id: &str,
        credentials: &Credentials,
        contacts: &[Contact],
    ) -> WriteTally {
        let mut tally = WriteTally::default();
        self.sink.start_batch().await;

        for contact in contacts.iter().take(self.policy.write_batch_limit) {
            tally.attempted += 1;

            let written = match self.sink.find_by_email(credentials, contact.email()).await {
                Some(existing) => self
                    .sink
                    .update_contact(credentials, existing.source_id(), contact)
                    .await
                    .map(|()| {
                        tally.updated += 1;
                        existing.source_id().to_string()
                    }),
                None => self
                    .sink
                    .create_contact(credentials, contact)
                    .await
                    .inspect(|_| tally.created += 1),
            };

            match written {
                Ok(sink_id) => {
                    if let Err(error) = self.contacts.upsert(user_id, &sink_id, contact).await {
                        tracing::warn!(error = %error, "Failed to mirror synced contact");
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        source_id = contact.source_id(),
                        error = %error,
                        "Contact write failed; skipping"
                    );
                }
            }
        }

        tally
    }
}

fn count(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::client::{PacedSink, UpstreamError};
    use crate::db::{Database, LibSqlContactRepository, LibSqlSyncRunRepository};
    use crate::error::{CredentialSide, Error};
    use crate::models::{ContactOrigin, RunId, RunStatus, SyncRun};
    use crate::util::unix_millis_now;
    use pretty_assertions::assert_eq;

    fn salesforce_contact(n: usize) -> Contact {
        Contact::new(
            ContactOrigin::Salesforce,
            format!("003{n:03}"),
            format!("person{n}@example.com"),
        )
        .with_name(format!("Person {n}"))
        .with_company("Acme")
    }

    fn hubspot_copy(contact: &Contact, id: &str) -> Contact {
        Contact::new(ContactOrigin::HubSpot, id, contact.email())
            .with_name(contact.name())
            .with_phone(contact.phone())
            .with_company(contact.company())
    }

    fn primary_credentials() -> Credentials {
        Credentials::new("sf-token").with_instance_url("https://acme.my.salesforce.com")
    }

    fn full_request() -> SyncRequest {
        SyncRequest::new("user-1", Tier::Full)
            .with_primary(primary_credentials())
            .with_sink(Credentials::new("hs-token"))
    }

    struct StaticSource {
        contacts: Vec<Contact>,
        delay: Duration,
    }

    impl StaticSource {
        fn with(count: usize) -> Self {
            Self {
                contacts: (0..count).map(salesforce_contact).collect(),
                delay: Duration::ZERO,
            }
        }
    }

    impl ContactSource for StaticSource {
        async fn fetch_contacts(
            &self,
            _credentials: &Credentials,
            limit: usize,
        ) -> Result<Vec<Contact>> {
            tokio::time::sleep(self.delay).await;
            Ok(self.contacts.iter().take(limit).cloned().collect())
        }
    }

    struct FailingSource {
        error: UpstreamError,
    }

    impl ContactSource for FailingSource {
        async fn fetch_contacts(
            &self,
            _credentials: &Credentials,
            _limit: usize,
        ) -> Result<Vec<Contact>> {
            Err(self.error.clone().into())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum SinkCall {
        Create(String),
        Update(String),
    }

    /// Sink double recording each write with the (paused) tokio clock.
    #[derive(Default)]
    struct RecordingSink {
        listed: Vec<Contact>,
        existing: HashMap<String, Contact>,
        failing_emails: HashSet<String>,
        list_error: Option<UpstreamError>,
        list_delay: Duration,
        calls: Mutex<Vec<(SinkCall, Instant)>>,
    }

    impl RecordingSink {
        fn holding(contacts: &[Contact]) -> Self {
            let existing = contacts
                .iter()
                .enumerate()
                .map(|(i, contact)| {
                    (
                        contact.email().to_string(),
                        hubspot_copy(contact, &format!("hs-{i}")),
                    )
                })
                .collect();
            Self {
                existing,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<(SinkCall, Instant)> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: SinkCall) {
            self.calls.lock().unwrap().push((call, Instant::now()));
        }
    }

    impl ContactSource for RecordingSink {
        async fn fetch_contacts(
            &self,
            _credentials: &Credentials,
            limit: usize,
        ) -> Result<Vec<Contact>> {
            tokio::time::sleep(self.list_delay).await;
            match &self.list_error {
                Some(error) => Err(error.clone().into()),
                None => Ok(self.listed.iter().take(limit).cloned().collect()),
            }
        }
    }

    impl ContactSink for RecordingSink {
        async fn find_by_email(&self, _credentials: &Credentials, email: &str) -> Option<Contact> {
            self.existing.get(email).cloned()
        }

        async fn create_contact(
            &self,
            _credentials: &Credentials,
            contact: &Contact,
        ) -> Result<String> {
            self.record(SinkCall::Create(contact.email().to_string()));
            if self.failing_emails.contains(contact.email()) {
                return Err(UpstreamError::http(ContactOrigin::HubSpot, 409, "conflict").into());
            }
            Ok(format!("new-{}", contact.source_id()))
        }

        async fn update_contact(
            &self,
            _credentials: &Credentials,
            external_id: &str,
            contact: &Contact,
        ) -> Result<()> {
            self.record(SinkCall::Update(external_id.to_string()));
            if self.failing_emails.contains(contact.email()) {
                return Err(UpstreamError::http(ContactOrigin::HubSpot, 500, "boom").into());
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryRunLog {
        runs: Mutex<Vec<SyncRun>>,
        reject_completion: bool,
    }

    impl MemoryRunLog {
        fn all(&self) -> Vec<SyncRun> {
            self.runs.lock().unwrap().clone()
        }
    }

    impl RunLog for MemoryRunLog {
        async fn start_run(&self, user_id: &str) -> Result<PendingRun> {
            let pending = PendingRun::new(RunId::new(), user_id, unix_millis_now());
            self.runs.lock().unwrap().push(SyncRun {
                id: pending.id(),
                user_id: user_id.to_string(),
                status: RunStatus::Running,
                contacts_processed: 0,
                conflicts_count: 0,
                error_message: None,
                started_at: pending.started_at(),
                completed_at: None,
            });
            Ok(pending)
        }

        async fn complete_run(&self, run: PendingRun, outcome: RunOutcome) -> Result<SyncRun> {
            if self.reject_completion {
                return Err(Error::Database("disk I/O error".to_string()));
            }
            let mut runs = self.runs.lock().unwrap();
            let stored = runs
                .iter_mut()
                .find(|stored| stored.id == run.id())
                .ok_or_else(|| Error::NotFound(run.id().to_string()))?;
            stored.status = outcome.status();
            stored.contacts_processed = outcome.contacts_processed();
            stored.conflicts_count = outcome.conflicts_count();
            stored.error_message = outcome.error_message().map(str::to_string);
            stored.completed_at = Some(unix_millis_now());
            Ok(stored.clone())
        }

        async fn recent_runs(&self, user_id: &str, limit: usize) -> Result<Vec<SyncRun>> {
            Ok(self
                .all()
                .into_iter()
                .rev()
                .filter(|run| run.user_id == user_id)
                .take(limit)
                .collect())
        }

        async fn get_run(&self, id: &RunId) -> Result<Option<SyncRun>> {
            Ok(self.all().into_iter().find(|run| run.id == *id))
        }
    }

    fn paced(sink: RecordingSink) -> PacedSink<RecordingSink> {
        PacedSink::new(sink, Duration::from_millis(200))
    }

    #[tokio::test(start_paused = true)]
    async fn limited_tier_returns_sample_and_never_writes() {
        let engine = SyncEngine::new(
            StaticSource::with(8),
            paced(RecordingSink::default()),
            MemoryRunLog::default(),
        );
        let request = SyncRequest {
            tier: Tier::Limited,
            ..full_request()
        };

        let summary = engine.run(&request).await.unwrap();

        assert_eq!(summary.contacts_found, 8);
        assert_eq!(summary.sample_contacts.len(), 5);
        assert_eq!(summary.writes_attempted, 0);
        assert_eq!(summary.processed(), 0);
        assert!(engine.sink().inner().calls().is_empty());

        let runs = engine.run_log().all();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RunStatus::Success);
        assert_eq!(runs[0].contacts_processed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn full_tier_caps_writes_and_spaces_them() {
        let source = StaticSource::with(12);
        let sink = RecordingSink::holding(&source.contacts[..3]);
        let engine = SyncEngine::new(source, paced(sink), MemoryRunLog::default());

        let summary = engine.run(&full_request()).await.unwrap();

        assert_eq!(summary.contacts_found, 12);
        assert_eq!(summary.writes_attempted, 10);
        assert_eq!(summary.updated, 3);
        assert_eq!(summary.created, 7);
        assert_eq!(summary.sample_contacts.len(), 5);

        let calls = engine.sink().inner().calls();
        assert_eq!(calls.len(), 10);
        assert_eq!(calls[0].0, SinkCall::Update("hs-0".to_string()));
        assert_eq!(calls[3].0, SinkCall::Create("person3@example.com".to_string()));
        for pair in calls.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= Duration::from_millis(200));
        }

        let runs = engine.run_log().all();
        assert_eq!(runs[0].contacts_processed, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_run_concurrently() {
        let source = StaticSource {
            delay: Duration::from_secs(1),
            ..StaticSource::with(1)
        };
        let sink = RecordingSink {
            list_delay: Duration::from_secs(1),
            ..RecordingSink::default()
        };
        let engine = SyncEngine::new(source, paced(sink), MemoryRunLog::default());

        let start = Instant::now();
        engine.run(&full_request()).await.unwrap();
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_secs(1));
        assert!(elapsed < Duration::from_millis(1500), "took {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_restarts_with_each_run() {
        let engine = SyncEngine::new(
            StaticSource::with(2),
            paced(RecordingSink::default()),
            MemoryRunLog::default(),
        );

        engine.run(&full_request()).await.unwrap();
        engine.run(&full_request()).await.unwrap();

        let calls = engine.sink().inner().calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[1].1 - calls[0].1, Duration::from_millis(200));
        assert_eq!(calls[2].1, calls[1].1);
        assert_eq!(calls[3].1 - calls[2].1, Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn completion_failure_is_returned_after_writes() {
        let run_log = MemoryRunLog {
            reject_completion: true,
            ..MemoryRunLog::default()
        };
        let engine = SyncEngine::new(
            StaticSource::with(2),
            paced(RecordingSink::default()),
            run_log,
        );

        let error = engine.run(&full_request()).await.unwrap_err();

        assert!(matches!(error, Error::Database(_)));
        assert_eq!(engine.sink().inner().calls().len(), 2);
        assert_eq!(engine.run_log().all()[0].status, RunStatus::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_full_runs_against_matching_sink_only_update() {
        let source = StaticSource::with(4);
        let sink = RecordingSink::holding(&source.contacts);
        let engine = SyncEngine::new(source, paced(sink), MemoryRunLog::default());

        let first = engine.run(&full_request()).await.unwrap();
        let second = engine.run(&full_request()).await.unwrap();

        assert_eq!(first.updated, 4);
        assert_eq!(second.updated, first.updated);
        assert_eq!(first.created, 0);
        assert_eq!(second.created, 0);
        assert_ne!(first.run_id, second.run_id);
        assert_eq!(engine.run_log().all().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_writes_are_skipped() {
        let source = StaticSource::with(3);
        let failing = source.contacts[1].email().to_string();
        let sink = RecordingSink {
            failing_emails: HashSet::from([failing]),
            ..RecordingSink::default()
        };
        let engine = SyncEngine::new(source, paced(sink), MemoryRunLog::default());

        let summary = engine.run(&full_request()).await.unwrap();

        assert_eq!(summary.writes_attempted, 3);
        assert_eq!(summary.created, 2);
        assert_eq!(summary.failed_writes(), 1);
        assert!(summary.message.contains("1 writes failed"));

        let runs = engine.run_log().all();
        assert_eq!(runs[0].status, RunStatus::Success);
        assert_eq!(runs[0].contacts_processed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn full_tier_without_sink_credentials_writes_nothing() {
        let engine = SyncEngine::new(
            StaticSource::with(3),
            paced(RecordingSink::default()),
            MemoryRunLog::default(),
        );
        let request = SyncRequest::new("user-1", Tier::Full).with_primary(primary_credentials());

        let summary = engine.run(&request).await.unwrap();

        assert_eq!(summary.contacts_found, 3);
        assert_eq!(summary.writes_attempted, 0);
        assert_eq!(summary.reconciliation.only_in_primary, 3);
        assert!(engine.sink().inner().calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn conflicts_are_counted_from_sink_listing() {
        let source = StaticSource::with(2);
        let renamed = hubspot_copy(&source.contacts[0], "hs-0").with_name("Someone Else");
        let sink = RecordingSink {
            listed: vec![renamed, hubspot_copy(&salesforce_contact(9), "hs-9")],
            ..RecordingSink::default()
        };
        let engine = SyncEngine::new(source, paced(sink), MemoryRunLog::default());

        let summary = engine.run(&full_request()).await.unwrap();

        assert_eq!(
            summary.reconciliation,
            ReconciliationReport {
                only_in_primary: 1,
                only_in_sink: 1,
                matched: 1,
                conflicts: 1,
            }
        );
        assert_eq!(engine.run_log().all()[0].conflicts_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_credentials_never_start_a_run() {
        let engine = SyncEngine::new(
            StaticSource::with(3),
            paced(RecordingSink::default()),
            MemoryRunLog::default(),
        );

        let error = engine
            .run(&SyncRequest::new("user-1", Tier::Full))
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            Error::MissingCredentials(CredentialSide::Primary)
        ));

        let blank_sink = SyncRequest::new("user-1", Tier::Full)
            .with_primary(primary_credentials())
            .with_sink(Credentials::new(" "));
        let error = engine.run(&blank_sink).await.unwrap_err();
        assert!(matches!(error, Error::MissingCredentials(CredentialSide::Sink)));

        assert!(engine.run_log().all().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sink_fetch_failure_fails_the_run() {
        let sink = RecordingSink {
            list_error: Some(UpstreamError::http(ContactOrigin::HubSpot, 401, "expired")),
            ..RecordingSink::default()
        };
        let engine = SyncEngine::new(StaticSource::with(3), paced(sink), MemoryRunLog::default());

        let error = engine.run(&full_request()).await.unwrap_err();
        assert!(matches!(error, Error::Upstream(_)));
        assert!(engine.sink().inner().calls().is_empty());

        let runs = engine.run_log().all();
        assert_eq!(runs[0].status, RunStatus::Error);
        assert_eq!(runs[0].error_message.as_deref(), Some(error.to_string().as_str()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn primary_fetch_failure_is_logged_verbatim() {
        let db = Database::open_in_memory().await.unwrap();
        let upstream = UpstreamError::http(
            ContactOrigin::Salesforce,
            503,
            "Service Unavailable: maintenance window",
        );
        let engine = SyncEngine::new(
            FailingSource {
                error: upstream.clone(),
            },
            RecordingSink::default(),
            LibSqlSyncRunRepository::new(db.connection()),
        );

        let error = engine.run(&full_request()).await.unwrap_err();
        assert!(matches!(error, Error::Upstream(ref e) if *e == upstream));

        let runs = engine.run_log().recent_runs("user-1", 10).await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RunStatus::Error);
        assert_eq!(runs[0].contacts_processed, 0);
        assert_eq!(runs[0].error_message, Some(upstream.to_string()));
        assert!(runs[0].completed_at.is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn long_upstream_bodies_are_logged_whole() {
        let db = Database::open_in_memory().await.unwrap();
        let body = format!("{}END-OF-BODY", "x".repeat(300));
        let engine = SyncEngine::new(
            FailingSource {
                error: UpstreamError::http(ContactOrigin::Salesforce, 400, body.clone()),
            },
            RecordingSink::default(),
            LibSqlSyncRunRepository::new(db.connection()),
        );

        engine.run(&full_request()).await.unwrap_err();

        let runs = engine.run_log().recent_runs("user-1", 10).await.unwrap();
        let stored = runs[0].error_message.as_deref().unwrap();
        assert_eq!(
            stored,
            format!("salesforce request failed with HTTP 400: {body}")
        );
        assert!(stored.ends_with("END-OF-BODY"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn successful_writes_are_mirrored_locally() {
        let db = Database::open_in_memory().await.unwrap();
        let source = StaticSource::with(3);
        let sink = RecordingSink {
            failing_emails: HashSet::from([source.contacts[2].email().to_string()]),
            ..RecordingSink::holding(&source.contacts[..1])
        };
        let engine = SyncEngine::new(
            source,
            PacedSink::new(sink, Duration::ZERO),
            LibSqlSyncRunRepository::new(db.connection()),
        )
        .with_contact_store(LibSqlContactRepository::new(db.connection()));

        let summary = engine.run(&full_request()).await.unwrap();
        assert_eq!(summary.processed(), 2);

        let mirror = LibSqlContactRepository::new(db.connection());
        let mut mirrored = mirror.list("user-1", 10).await.unwrap();
        mirrored.sort_by(|a, b| a.email.cmp(&b.email));
        let ids: Vec<&str> = mirrored.iter().map(|row| row.source_id.as_str()).collect();
        assert_eq!(ids, vec!["hs-0", "new-003001"]);

        let run = engine
            .run_log()
            .get_run(&summary.run_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(run.contacts_processed, 2);
    }
}
