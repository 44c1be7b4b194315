//! Job synchronization: ledger records merged with off-ledger metadata.
//!
//! A pass is caller-driven. It checks the network, reads `count()`, then
//! fetches every record concurrently (bounded by `max_concurrent_fetches`)
//! while keeping results in ascending project id order. A record that cannot
//! be fetched fails the whole pass; metadata that cannot be resolved only
//! degrades that one view to placeholders.

use alloy::primitives::Address;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::content::ContentResolver;
use crate::error::{EngineError, EngineResult};
use crate::jobs::cache::{ViewCache, ViewSnapshot};
use crate::jobs::types::{JobView, ProjectRecord, ProjectStatus};
use crate::ledger::guard::NetworkGuard;
use crate::ledger::reader::LedgerReader;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy)]
enum ViewFilter {
    Open,
    Client(Address),
}

impl ViewFilter {
    fn matches(&self, record: &ProjectRecord) -> bool {
        match self {
            ViewFilter::Open => record.status == ProjectStatus::Created,
            ViewFilter::Client(account) => record.is_client(account),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ViewFilter::Open => "open",
            ViewFilter::Client(_) => "account",
        }
    }
}

/// Builds [`JobView`] listings from the ledger and the content store.
#[derive(Clone)]
pub struct JobSynchronizer {
    ledger: Arc<dyn LedgerReader>,
    resolver: ContentResolver,
    guard: NetworkGuard,
    cache: Arc<ViewCache>,
    max_concurrent: usize,
}

impl JobSynchronizer {
    pub fn new(
        ledger: Arc<dyn LedgerReader>,
        resolver: ContentResolver,
        guard: NetworkGuard,
        max_concurrent: usize,
    ) -> Self {
        Self {
            ledger,
            resolver,
            guard,
            cache: Arc::new(ViewCache::new()),
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Every project still in `Created`, ascending by id.
    pub async fn list_open_jobs(&self) -> EngineResult<Vec<JobView>> {
        let generation = self.cache.generation();
        let jobs = self.run_pass(ViewFilter::Open).await?;
        self.cache.store_open(generation, jobs.clone());
        Ok(jobs)
    }

    /// Every project whose client is `account`, any status, ascending by id.
    ///
    /// With no account this returns an empty listing without touching the
    /// ledger.
    pub async fn list_jobs_for_account(
        &self,
        account: Option<Address>,
    ) -> EngineResult<Vec<JobView>> {
        let Some(account) = account else {
            return Ok(Vec::new());
        };
        let generation = self.cache.generation();
        let jobs = self.run_pass(ViewFilter::Client(account)).await?;
        self.cache.store_account(generation, account, jobs.clone());
        Ok(jobs)
    }

    /// Last open-jobs listing, unless a write has invalidated it since.
    pub fn cached_open_jobs(&self) -> Option<Arc<ViewSnapshot>> {
        self.cache.open()
    }

    pub fn cached_jobs_for_account(&self, account: &Address) -> Option<Arc<ViewSnapshot>> {
        self.cache.account(account)
    }

    /// Mark every cached listing stale.
    pub fn invalidate(&self) {
        tracing::debug!("Job views invalidated");
        self.cache.invalidate();
    }

    pub fn is_stale(&self) -> bool {
        self.cache.is_stale()
    }

    pub fn guard(&self) -> NetworkGuard {
        self.guard
    }

    async fn run_pass(&self, filter: ViewFilter) -> EngineResult<Vec<JobView>> {
        let view = filter.label();
        let span = tracing::info_span!("sync_pass", view = view, pass_id = %Uuid::new_v4());
        let started = Instant::now();

        let result = self.collect(filter).instrument(span).await;
        metrics::record_sync_pass(view, result.is_ok(), started);
        match &result {
            Ok(jobs) => tracing::info!(
                view = view,
                jobs = jobs.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Synchronization pass complete"
            ),
            Err(e) => tracing::error!(view = view, error = %e, "Synchronization pass failed"),
        }
        result
    }

    async fn collect(&self, filter: ViewFilter) -> EngineResult<Vec<JobView>> {
        self.guard.check_ledger(self.ledger.as_ref()).await?;

        let count = self.ledger.count().await?;
        tracing::debug!(count = count, "Enumerating projects");

        let views: Vec<Option<JobView>> = stream::iter(0..count)
            .map(|project_id| self.fetch_view(project_id, filter))
            .buffered(self.max_concurrent)
            .try_collect()
            .await?;

        Ok(views.into_iter().flatten().collect())
    }

    async fn fetch_view(&self, project_id: u64, filter: ViewFilter) -> EngineResult<Option<JobView>> {
        let record = self
            .ledger
            .get(project_id)
            .await
            .map_err(|e| tag_project(e, project_id))?;

        if !filter.matches(&record) {
            return Ok(None);
        }

        let metadata = self
            .resolver
            .resolve_or_placeholder(project_id, &record.description_cid)
            .await;
        Ok(Some(JobView::merge(record, metadata)))
    }
}

/// Attach the failing id to a ledger error that lacks one.
fn tag_project(err: EngineError, project_id: u64) -> EngineError {
    match err {
        EngineError::LedgerCall {
            project_id: None,
            reason,
        } => EngineError::ledger(project_id, reason),
        other => other,
    }
}

impl std::fmt::Debug for JobSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobSynchronizer")
            .field("guard", &self.guard)
            .field("max_concurrent", &self.max_concurrent)
            .field("stale", &self.is_stale())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::InMemoryContentStore;
    use crate::jobs::types::{JobMetadata, NOT_AVAILABLE};
    use crate::ledger::memory::InMemoryLedger;
    use alloy::primitives::U256;

    const CHAIN: u64 = 296;

    struct Fixture {
        ledger: Arc<InMemoryLedger>,
        store: Arc<InMemoryContentStore>,
        sync: JobSynchronizer,
    }

    fn fixture() -> Fixture {
        let ledger = Arc::new(InMemoryLedger::new(CHAIN, Address::repeat_byte(0xee)));
        let store = Arc::new(InMemoryContentStore::new());
        let resolver = ContentResolver::new(store.clone(), false);
        let sync = JobSynchronizer::new(ledger.clone(), resolver, NetworkGuard::new(CHAIN), 4);
        Fixture { ledger, store, sync }
    }

    fn seed(f: &Fixture, client: Address, status: ProjectStatus, title: &str) -> u64 {
        let cid = format!("bafy{}", title.to_lowercase());
        let meta = JobMetadata {
            title: title.to_string(),
            description: format!("{} description", title),
            budget: "1".to_string(),
            ..JobMetadata::default()
        };
        f.store
            .insert_raw(&cid, serde_json::to_vec(&meta).unwrap());
        f.ledger.seed(ProjectRecord {
            project_id: 0,
            client,
            freelancer: Address::ZERO,
            amount: U256::from(1u64),
            description_cid: cid,
            deliverable_cid: String::new(),
            status,
            created_at: 1_700_000_000,
            deadline: 1_800_000_000,
        })
    }

    #[tokio::test]
    async fn test_open_jobs_filter_and_order() {
        let f = fixture();
        let alice = Address::repeat_byte(0x0a);
        seed(&f, alice, ProjectStatus::Created, "First");
        seed(&f, alice, ProjectStatus::Completed, "Done");
        seed(&f, alice, ProjectStatus::Created, "Third");

        let jobs = f.sync.list_open_jobs().await.unwrap();
        let ids: Vec<u64> = jobs.iter().map(|j| j.project_id).collect();
        assert_eq!(ids, vec![0, 2]);
        assert_eq!(jobs[1].title, "Third");
        assert!(f.sync.cached_open_jobs().is_some());
    }

    #[tokio::test]
    async fn test_account_view_without_account_is_silent() {
        let f = fixture();
        seed(&f, Address::repeat_byte(0x0a), ProjectStatus::Created, "Job");

        let jobs = f.sync.list_jobs_for_account(None).await.unwrap();
        assert!(jobs.is_empty());
        assert_eq!(f.ledger.read_calls(), 0);
    }

    #[tokio::test]
    async fn test_network_mismatch_short_circuits() {
        let f = fixture();
        seed(&f, Address::repeat_byte(0x0a), ProjectStatus::Created, "Job");
        f.ledger.set_chain_id(1);

        let err = f.sync.list_open_jobs().await.unwrap_err();
        assert!(matches!(err, EngineError::NetworkMismatch { expected: 296, actual: 1 }));
        // Only the chain id query.
        assert_eq!(f.ledger.read_calls(), 1);
        assert_eq!(f.store.get_calls(), 0);
    }

    #[tokio::test]
    async fn test_unresolvable_metadata_degrades() {
        let f = fixture();
        let alice = Address::repeat_byte(0x0a);
        seed(&f, alice, ProjectStatus::Created, "Good");
        let id = seed(&f, alice, ProjectStatus::Created, "Bad");
        f.store.make_unavailable("bafybad");

        let jobs = f.sync.list_open_jobs().await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[id as usize].title, NOT_AVAILABLE);
        assert!(!jobs[id as usize].metadata_resolved);
        assert_eq!(jobs[0].title, "Good");
    }

    #[tokio::test]
    async fn test_failed_fetch_fails_pass_and_keeps_cache() {
        let f = fixture();
        let alice = Address::repeat_byte(0x0a);
        for title in ["A", "B", "C"] {
            seed(&f, alice, ProjectStatus::Created, title);
        }
        f.sync.list_open_jobs().await.unwrap();

        f.ledger.fail_reads_for(1);
        let err = f.sync.list_open_jobs().await.unwrap_err();
        assert!(matches!(err, EngineError::LedgerCall { project_id: Some(1), .. }));

        let cached = f.sync.cached_open_jobs().unwrap();
        assert_eq!(cached.jobs.len(), 3);
    }

    #[test]
    fn test_tag_project_keeps_existing_id() {
        let err = tag_project(EngineError::ledger(4, "boom"), 9);
        assert_eq!(err, EngineError::ledger(4, "boom"));
        let err = tag_project(EngineError::ledger_call("boom"), 9);
        assert_eq!(err, EngineError::ledger(9, "boom"));
    }

    /// Delays low ids the longest so fetches complete in reverse order.
    struct SlowLowIds {
        inner: Arc<InMemoryLedger>,
        in_flight: std::sync::atomic::AtomicUsize,
        peak: std::sync::atomic::AtomicUsize,
        finished: std::sync::Mutex<Vec<u64>>,
    }

    #[async_trait::async_trait]
    impl LedgerReader for SlowLowIds {
        async fn chain_id(&self) -> EngineResult<crate::ledger::types::ChainId> {
            LedgerReader::chain_id(self.inner.as_ref()).await
        }

        async fn count(&self) -> EngineResult<u64> {
            self.inner.count().await
        }

        async fn get(&self, project_id: u64) -> EngineResult<ProjectRecord> {
            use std::sync::atomic::Ordering;
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let delay = 10 * (8u64.saturating_sub(project_id));
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.finished.lock().unwrap().push(project_id);
            self.inner.get(project_id).await
        }
    }

    #[tokio::test]
    async fn test_out_of_order_fetches_keep_ascending_ids() {
        let f = fixture();
        let alice = Address::repeat_byte(0x0a);
        for i in 0..8 {
            seed(&f, alice, ProjectStatus::Created, &format!("Job{}", i));
        }

        let slow = Arc::new(SlowLowIds {
            inner: f.ledger.clone(),
            in_flight: Default::default(),
            peak: Default::default(),
            finished: Default::default(),
        });
        let resolver = ContentResolver::new(f.store.clone(), false);
        let sync = JobSynchronizer::new(slow.clone(), resolver, NetworkGuard::new(CHAIN), 4);

        let jobs = sync.list_open_jobs().await.unwrap();
        let ids: Vec<u64> = jobs.iter().map(|j| j.project_id).collect();
        assert_eq!(ids, (0..8).collect::<Vec<u64>>());
        assert_eq!(jobs[0].title, "Job0");

        let finished = slow.finished.lock().unwrap().clone();
        assert_ne!(finished, ids);
        let peak = slow.peak.load(std::sync::atomic::Ordering::SeqCst);
        assert!(peak > 1 && peak <= 4, "peak concurrency {}", peak);
    }
}
