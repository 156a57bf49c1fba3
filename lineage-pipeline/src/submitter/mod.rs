//! Bounded-concurrency submission of relationships to the catalog.
//!
//! Rows are grouped into units (one relationship in per-record mode, a chunk
//! in bulk mode). Each unit runs as its own task holding a semaphore permit,
//! so at most `max_concurrency` remote calls are ever in flight. Outcomes are
//! written straight into the shared [`ResultAggregator`].

mod config;

pub use config::{RetryPolicy, SubmitterConfig};

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use lineage_repository::{ApiError, CatalogClient, ErrorClass, RemoteId};
use lineage_shared::{RecordState, Relationship, SubmissionOutcome};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use crate::aggregator::ResultAggregator;
use crate::cancel::CancellationSignal;
use crate::errors::PipelineError;

const CANCELLED_REASON: &str = "ingestion cancelled";

/// How a submission run ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitReport {
    /// The fatal error that stopped the batch, if any.
    pub aborted: Option<String>,
    /// Cancellation stopped dispatch before every row was submitted.
    pub cancelled: bool,
}

/// Submits relationships to a [`CatalogClient`].
pub struct BatchSubmitter {
    client: Arc<dyn CatalogClient>,
    config: SubmitterConfig,
}

impl BatchSubmitter {
    pub fn new(
        client: Arc<dyn CatalogClient>,
        config: SubmitterConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SubmitterConfig {
        &self.config
    }

    /// Submit every item and record one outcome per row.
    ///
    /// Rows are expected in `Built` state. A fatal client error or
    /// cancellation stops dispatch, and every row whose first remote call has
    /// not started yet is marked skipped, including rows already handed to a
    /// task. Calls already made finish with their retry budget.
    #[instrument(
        skip(self, items, aggregator, cancel),
        fields(
            rows = items.len(),
            chunk_size = self.config.chunk_size,
            max_concurrency = self.config.max_concurrency
        )
    )]
    pub async fn submit(
        &self,
        items: Vec<(usize, Relationship)>,
        aggregator: Arc<ResultAggregator>,
        cancel: &CancellationSignal,
    ) -> SubmitReport {
        let context = Arc::new(SubmitContext {
            client: Arc::clone(&self.client),
            config: self.config.clone(),
            aggregator,
            cancel: cancel.clone(),
            halt: OnceLock::new(),
            cancelled: AtomicBool::new(false),
        });
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let mut tasks = JoinSet::new();
        let mut cancelled = false;

        let mut remaining = items.into_iter();
        loop {
            let unit: Vec<(usize, Relationship)> =
                remaining.by_ref().take(self.config.chunk_size).collect();
            if unit.is_empty() {
                break;
            }

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };

            let stop_reason = match (context.halt.get(), permit.as_ref()) {
                (Some(fatal), _) => Some(abort_reason(fatal)),
                (None, None) => {
                    cancelled = true;
                    Some(CANCELLED_REASON.to_string())
                }
                (None, Some(_)) if cancel.is_cancelled() => {
                    cancelled = true;
                    Some(CANCELLED_REASON.to_string())
                }
                _ => None,
            };

            if let Some(reason) = stop_reason {
                let skipped = context.skip_all(unit.into_iter().chain(remaining.by_ref()), &reason);
                warn!(skipped, reason = %reason, "Stopped dispatching rows");
                break;
            }

            for (row_index, _) in &unit {
                context.aggregator.advance(*row_index, RecordState::Submitting);
            }

            let context = Arc::clone(&context);
            tasks.spawn(async move {
                let _permit = permit;
                if context.config.is_bulk() {
                    context.submit_chunk(unit).await;
                } else {
                    for (row_index, relationship) in unit {
                        let outcome = context.submit_record(row_index, relationship).await;
                        context.aggregator.record(outcome);
                    }
                }
            });
            // Let the new task reach its first call before dispatching more, so
            // a fatal error or cancellation it triggers is seen by the next unit.
            tokio::task::yield_now().await;
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Submission task failed");
            }
        }

        let aborted = context.halt.get().cloned();
        let cancelled = cancelled || context.cancelled.load(Ordering::Acquire);
        info!(aborted = aborted.is_some(), cancelled, "Submission finished");
        SubmitReport { aborted, cancelled }
    }
}

fn abort_reason(fatal: &str) -> String {
    format!("batch aborted after fatal error: {}", fatal)
}

/// State shared by all submission tasks of one run.
struct SubmitContext {
    client: Arc<dyn CatalogClient>,
    config: SubmitterConfig,
    aggregator: Arc<ResultAggregator>,
    cancel: CancellationSignal,
    /// Set once by the first fatal error.
    halt: OnceLock<String>,
    /// A task skipped rows because of cancellation.
    cancelled: AtomicBool,
}

enum Lookup {
    Found(RemoteId),
    Missing,
    Fatal(ApiError),
}

impl SubmitContext {
    fn halted(&self) -> Option<&String> {
        self.halt.get()
    }

    /// Why a row that has not made its first call must not start, if at all.
    fn stop_reason(&self) -> Option<String> {
        if let Some(fatal) = self.halted() {
            return Some(abort_reason(fatal));
        }
        if self.cancel.is_cancelled() {
            self.cancelled.store(true, Ordering::Release);
            return Some(CANCELLED_REASON.to_string());
        }
        None
    }

    fn halt(&self, err: &ApiError) {
        if self.halt.set(err.to_string()).is_ok() {
            error!(error = %err, "Fatal catalog error, aborting remaining submissions");
        }
    }

    fn skip_all(&self, rows: impl Iterator<Item = (usize, Relationship)>, reason: &str) -> usize {
        rows.map(|(row_index, relationship)| {
            self.aggregator
                .record(SubmissionOutcome::skipped(row_index, Some(relationship), reason))
        })
        .count()
    }

    /// Run one remote call under the per-call timeout.
    async fn call<T>(
        &self,
        request: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, ApiError> {
        match tokio::time::timeout(self.config.call_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::timeout(format!(
                "no response within {:?}",
                self.config.call_timeout
            ))),
        }
    }

    /// Idempotency check. Lookup failures other than fatal ones are logged
    /// and submission goes ahead.
    async fn lookup(&self, relationship: &Relationship) -> Lookup {
        if !self.client.supports_identity_lookup() {
            return Lookup::Missing;
        }

        let hash = relationship.identity_hash();
        match self.call(self.client.find_by_identity_hash(hash)).await {
            Ok(Some(remote_id)) => Lookup::Found(remote_id),
            Ok(None) => Lookup::Missing,
            Err(err) if err.is_fatal() => Lookup::Fatal(err),
            Err(err) => {
                warn!(identity_hash = hash, error = %err, "Identity lookup failed, submitting anyway");
                Lookup::Missing
            }
        }
    }

    async fn submit_record(&self, row_index: usize, relationship: Relationship) -> SubmissionOutcome {
        if let Some(reason) = self.stop_reason() {
            return SubmissionOutcome::skipped(row_index, Some(relationship), reason);
        }

        match self.lookup(&relationship).await {
            Lookup::Found(remote_id) => {
                debug!(row_index, remote_id = %remote_id, "Relationship already exists");
                return SubmissionOutcome::duplicate(row_index, relationship, remote_id);
            }
            Lookup::Fatal(err) => {
                self.halt(&err);
                return SubmissionOutcome::failed(row_index, Some(relationship), err.to_string(), 0);
            }
            Lookup::Missing => {}
        }

        if let Some(reason) = self.stop_reason() {
            return SubmissionOutcome::skipped(row_index, Some(relationship), reason);
        }

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let err = match self.call(self.client.create(&relationship)).await {
                Ok(remote_id) => {
                    if attempts > 1 {
                        info!(row_index, attempts, "Relationship created after retry");
                    }
                    return SubmissionOutcome::succeeded(row_index, relationship, remote_id, attempts);
                }
                Err(err) => err,
            };

            match err.class() {
                ErrorClass::Transient if attempts <= self.config.retry.max_retries => {
                    if let Some(detail) = self.abandoned(&err) {
                        return SubmissionOutcome::failed(row_index, Some(relationship), detail, attempts);
                    }
                    let delay = self.config.retry.delay_for(attempts, err.retry_after);
                    warn!(
                        row_index,
                        attempt = attempts,
                        max_retries = self.config.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Create failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    if let Some(detail) = self.abandoned(&err) {
                        return SubmissionOutcome::failed(row_index, Some(relationship), detail, attempts);
                    }
                }
                ErrorClass::Transient => {
                    return SubmissionOutcome::failed(
                        row_index,
                        Some(relationship),
                        format!("{} (gave up after {} attempts)", err, attempts),
                        attempts,
                    );
                }
                ErrorClass::Permanent => {
                    debug!(row_index, error = %err, "Relationship rejected");
                    return SubmissionOutcome::failed(row_index, Some(relationship), err.to_string(), attempts);
                }
                ErrorClass::Fatal => {
                    self.halt(&err);
                    return SubmissionOutcome::failed(row_index, Some(relationship), err.to_string(), attempts);
                }
            }
        }
    }

    /// Failure detail for a retry that will not happen because the batch halted.
    fn abandoned(&self, last: &ApiError) -> Option<String> {
        self.halted()
            .map(|fatal| format!("{} (retry abandoned: {})", last, abort_reason(fatal)))
    }

    /// Submit one chunk with `bulk_create`.
    ///
    /// Items that fail transiently are resubmitted together in the next round,
    /// sharing the chunk's attempt budget. A chunk-level error applies to every
    /// item still pending.
    async fn submit_chunk(&self, unit: Vec<(usize, Relationship)>) {
        let mut pending = Vec::with_capacity(unit.len());
        // One lookup per item, sequentially, before the chunk is sent. Bulk
        // mode pays this extra round-trip per row to keep reruns idempotent.
        for (row_index, relationship) in unit {
            if let Some(reason) = self.stop_reason() {
                self.aggregator
                    .record(SubmissionOutcome::skipped(row_index, Some(relationship), reason));
                continue;
            }
            match self.lookup(&relationship).await {
                Lookup::Found(remote_id) => {
                    self.aggregator
                        .record(SubmissionOutcome::duplicate(row_index, relationship, remote_id));
                }
                Lookup::Fatal(err) => {
                    self.halt(&err);
                    self.aggregator.record(SubmissionOutcome::failed(
                        row_index,
                        Some(relationship),
                        err.to_string(),
                        0,
                    ));
                }
                Lookup::Missing => pending.push((row_index, relationship)),
            }
        }

        if let Some(reason) = self.stop_reason() {
            self.skip_all(pending.drain(..), &reason);
        }

        let mut attempts = 0u32;
        while !pending.is_empty() {
            attempts += 1;
            let relationships: Vec<Relationship> =
                pending.iter().map(|(_, relationship)| relationship.clone()).collect();
            let result = self
                .call(self.client.bulk_create(&relationships))
                .await
                .and_then(|results| {
                    if results.len() == relationships.len() {
                        Ok(results)
                    } else {
                        Err(ApiError::invalid_response(format!(
                            "bulk create returned {} results for {} relationships",
                            results.len(),
                            relationships.len()
                        )))
                    }
                });

            let mut retry = Vec::new();
            let mut hint = None;
            match result {
                Ok(results) => {
                    for ((row_index, relationship), result) in pending.drain(..).zip(results) {
                        match result {
                            Ok(remote_id) => {
                                self.aggregator.record(SubmissionOutcome::succeeded(
                                    row_index,
                                    relationship,
                                    remote_id,
                                    attempts,
                                ));
                            }
                            Err(err) => {
                                if self.should_retry(&err, attempts) {
                                    hint = hint.max(err.retry_after);
                                    retry.push((row_index, relationship));
                                } else {
                                    let outcome =
                                        self.settle_failure(row_index, relationship, &err, attempts);
                                    self.aggregator.record(outcome);
                                }
                            }
                        }
                    }
                }
                Err(err) => {
                    warn!(items = pending.len(), attempt = attempts, error = %err, "Bulk create failed");
                    if self.should_retry(&err, attempts) {
                        hint = err.retry_after;
                        retry = std::mem::take(&mut pending);
                    } else {
                        for (row_index, relationship) in pending.drain(..) {
                            let outcome = self.settle_failure(row_index, relationship, &err, attempts);
                            self.aggregator.record(outcome);
                        }
                    }
                }
            }

            pending = retry;
            if pending.is_empty() {
                break;
            }

            let delay = self.config.retry.delay_for(attempts, hint);
            warn!(
                items = pending.len(),
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                "Retrying bulk items"
            );
            tokio::time::sleep(delay).await;

            if let Some(fatal) = self.halted() {
                let detail = format!("retry abandoned: {}", abort_reason(fatal));
                for (row_index, relationship) in pending.drain(..) {
                    self.aggregator.record(SubmissionOutcome::failed(
                        row_index,
                        Some(relationship),
                        detail.clone(),
                        attempts,
                    ));
                }
            }
        }
    }

    fn should_retry(&self, err: &ApiError, attempts: u32) -> bool {
        err.is_transient() && attempts <= self.config.retry.max_retries
    }

    /// Outcome for an error that will not be retried.
    fn settle_failure(
        &self,
        row_index: usize,
        relationship: Relationship,
        err: &ApiError,
        attempts: u32,
    ) -> SubmissionOutcome {
        let detail = match err.class() {
            ErrorClass::Transient => format!("{} (gave up after {} attempts)", err, attempts),
            ErrorClass::Permanent => err.to_string(),
            ErrorClass::Fatal => {
                self.halt(err);
                err.to_string()
            }
        };
        SubmissionOutcome::failed(row_index, Some(relationship), detail, attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lineage_repository::InMemoryCatalogClient;
    use lineage_shared::OutcomeState;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Mutex;

    fn items(n: usize) -> Vec<(usize, Relationship)> {
        (0..n)
            .map(|i| {
                (
                    i,
                    Relationship::new(format!("source-{}", i), "target", "feeds", BTreeMap::new()),
                )
            })
            .collect()
    }

    fn built(n: usize) -> Arc<ResultAggregator> {
        let aggregator = ResultAggregator::new(n);
        for row in 0..n {
            aggregator.advance(row, RecordState::Validated);
            aggregator.advance(row, RecordState::Built);
        }
        Arc::new(aggregator)
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(40),
        }
    }

    async fn run(
        client: Arc<dyn CatalogClient>,
        config: SubmitterConfig,
        n: usize,
    ) -> (SubmitReport, lineage_shared::BatchSummary) {
        let aggregator = built(n);
        let submitter = BatchSubmitter::new(client, config).unwrap();
        let report = submitter
            .submit(items(n), Arc::clone(&aggregator), &CancellationSignal::new())
            .await;
        let summary = aggregator.finish(report.aborted.clone(), report.cancelled, chrono::Utc::now());
        (report, summary)
    }

    /// Fails each create with a scripted error until the script runs out.
    struct ScriptedClient {
        script: Mutex<Vec<ApiError>>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(script: Vec<ApiError>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CatalogClient for ScriptedClient {
        async fn create(&self, _relationship: &Relationship) -> Result<RemoteId, ApiError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().await;
            if script.is_empty() {
                Ok(RemoteId::new(format!("id-{}", n)))
            } else {
                Err(script.remove(0))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_error_is_retried() {
        let client = Arc::new(ScriptedClient::new(vec![
            ApiError::server("503"),
            ApiError::throttled("slow down", Some(Duration::from_millis(30))),
        ]));
        let config = SubmitterConfig::default()
            .with_max_concurrency(1)
            .with_retry(fast_retry());

        let (report, summary) = run(client.clone(), config, 1).await;

        assert_eq!(report, SubmitReport::default());
        assert_eq!(summary.created, 1);
        assert_eq!(summary.outcomes[0].attempts, 3);
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let client = Arc::new(ScriptedClient::new(vec![ApiError::rejected("bad type")]));
        let config = SubmitterConfig::default().with_max_concurrency(1);

        let (_, summary) = run(client.clone(), config, 2).await;

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.outcomes[0].attempts, 1);
        assert!(summary.errors[0].message.contains("bad type"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fatal_error_skips_remaining_rows() {
        let client = Arc::new(ScriptedClient::new(vec![ApiError::unauthorized("token expired")]));
        let config = SubmitterConfig::default().with_max_concurrency(1);

        let (report, summary) = run(client, config, 3).await;

        assert!(report.aborted.as_deref().is_some_and(|r| r.contains("token expired")));
        assert_eq!(summary.outcomes[0].state, OutcomeState::Failed);
        assert_eq!(summary.outcomes[1].state, OutcomeState::Skipped);
        assert_eq!(summary.outcomes[2].state, OutcomeState::Skipped);
        assert!(summary.outcomes[1]
            .error_detail
            .as_deref()
            .is_some_and(|d| d.starts_with("batch aborted")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        struct Slow;

        #[async_trait]
        impl CatalogClient for Slow {
            async fn create(&self, _relationship: &Relationship) -> Result<RemoteId, ApiError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(RemoteId::new("late"))
            }
        }

        let config = SubmitterConfig::default()
            .with_call_timeout(Duration::from_secs(1))
            .with_retry(fast_retry());

        let (_, summary) = run(Arc::new(Slow), config, 1).await;

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.outcomes[0].attempts, 3);
        assert!(summary.errors[0].message.starts_with("timeout"));
    }

    #[tokio::test]
    async fn test_bulk_mode_uses_chunks() {
        let client = Arc::new(InMemoryCatalogClient::new().without_identity_lookup());
        let config = SubmitterConfig::default().with_chunk_size(4);

        let (_, summary) = run(client.clone(), config, 10).await;

        assert_eq!(summary.created, 10);
        assert_eq!(client.bulk_calls(), 3);
        assert_eq!(client.len().await, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bulk_item_errors_are_isolated() {
        /// Rejects item 1 of every chunk and throttles item 2 once.
        struct PartialBulk {
            rounds: AtomicUsize,
        }

        #[async_trait]
        impl CatalogClient for PartialBulk {
            async fn create(&self, _relationship: &Relationship) -> Result<RemoteId, ApiError> {
                unreachable!("bulk mode only")
            }

            async fn bulk_create(
                &self,
                relationships: &[Relationship],
            ) -> Result<Vec<Result<RemoteId, ApiError>>, ApiError> {
                let round = self.rounds.fetch_add(1, Ordering::SeqCst);
                Ok(relationships
                    .iter()
                    .map(|r| match (round, r.source_id()) {
                        (_, "source-1") => Err(ApiError::rejected("unknown entity")),
                        (0, "source-2") => Err(ApiError::throttled("busy", None)),
                        _ => Ok(RemoteId::new(format!("id-{}", r.source_id()))),
                    })
                    .collect())
            }
        }

        let client = Arc::new(PartialBulk {
            rounds: AtomicUsize::new(0),
        });
        let config = SubmitterConfig::default()
            .with_chunk_size(3)
            .with_max_concurrency(1)
            .with_retry(fast_retry());

        let (_, summary) = run(client, config, 3).await;

        assert_eq!(summary.created, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors[0].row_index, 1);
        assert_eq!(summary.outcomes[0].attempts, 1);
        assert_eq!(summary.outcomes[2].attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bulk_chunk_failure_applies_to_every_item() {
        struct Down;

        #[async_trait]
        impl CatalogClient for Down {
            async fn create(&self, _relationship: &Relationship) -> Result<RemoteId, ApiError> {
                Err(ApiError::connection("refused"))
            }

            async fn bulk_create(
                &self,
                _relationships: &[Relationship],
            ) -> Result<Vec<Result<RemoteId, ApiError>>, ApiError> {
                Err(ApiError::connection("refused"))
            }
        }

        let config = SubmitterConfig::default()
            .with_chunk_size(2)
            .with_retry(fast_retry());

        let (report, summary) = run(Arc::new(Down), config, 3).await;

        assert!(report.aborted.is_none());
        assert_eq!(summary.failed, 3);
        assert!(summary.outcomes.iter().all(|o| o.attempts == 3));
    }

    #[tokio::test]
    async fn test_bulk_length_mismatch_is_invalid_response() {
        struct Short;

        #[async_trait]
        impl CatalogClient for Short {
            async fn create(&self, _relationship: &Relationship) -> Result<RemoteId, ApiError> {
                Ok(RemoteId::new("x"))
            }

            async fn bulk_create(
                &self,
                _relationships: &[Relationship],
            ) -> Result<Vec<Result<RemoteId, ApiError>>, ApiError> {
                Ok(vec![Ok(RemoteId::new("only-one"))])
            }
        }

        let config = SubmitterConfig::default().with_chunk_size(2);

        let (_, summary) = run(Arc::new(Short), config, 2).await;

        assert_eq!(summary.failed, 2);
        assert!(summary.errors[0].message.contains("invalid response"));
    }

    #[tokio::test]
    async fn test_cancelled_before_dispatch_skips_everything() {
        let client = Arc::new(InMemoryCatalogClient::new());
        let aggregator = built(3);
        let cancel = CancellationSignal::new();
        cancel.cancel();

        let submitter = BatchSubmitter::new(client.clone(), SubmitterConfig::default()).unwrap();
        let report = submitter.submit(items(3), Arc::clone(&aggregator), &cancel).await;
        let summary = aggregator.finish(None, report.cancelled, chrono::Utc::now());

        assert!(report.cancelled);
        assert_eq!(summary.skipped, 3);
        assert_eq!(client.create_calls(), 0);
        assert_eq!(summary.outcomes[0].error_detail.as_deref(), Some(CANCELLED_REASON));
    }

    #[tokio::test]
    async fn test_cancel_during_lookup_skips_row_before_create() {
        /// Raises the signal while looking up the second row.
        struct CancelsDuringLookup {
            signal: CancellationSignal,
            lookups: AtomicUsize,
            creates: AtomicUsize,
        }

        #[async_trait]
        impl CatalogClient for CancelsDuringLookup {
            async fn create(&self, _relationship: &Relationship) -> Result<RemoteId, ApiError> {
                self.creates.fetch_add(1, Ordering::SeqCst);
                Ok(RemoteId::new("created"))
            }

            fn supports_identity_lookup(&self) -> bool {
                true
            }

            async fn find_by_identity_hash(&self, _hash: &str) -> Result<Option<RemoteId>, ApiError> {
                if self.lookups.fetch_add(1, Ordering::SeqCst) == 1 {
                    self.signal.cancel();
                }
                Ok(None)
            }
        }

        let cancel = CancellationSignal::new();
        let client = Arc::new(CancelsDuringLookup {
            signal: cancel.clone(),
            lookups: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
        });
        let aggregator = built(4);

        let submitter = BatchSubmitter::new(client.clone(), SubmitterConfig::default()).unwrap();
        let report = submitter.submit(items(4), Arc::clone(&aggregator), &cancel).await;
        let summary = aggregator.finish(None, report.cancelled, chrono::Utc::now());

        assert!(report.cancelled);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.outcomes[1].state, OutcomeState::Skipped);
        assert_eq!(summary.outcomes[1].error_detail.as_deref(), Some(CANCELLED_REASON));
        assert_eq!(client.creates.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let client: Arc<dyn CatalogClient> = Arc::new(InMemoryCatalogClient::new());
        assert!(BatchSubmitter::new(client, SubmitterConfig::default().with_chunk_size(0)).is_err());
    }
}
