//! Last-synchronized job views.
//!
//! Views are derived data: any write that succeeds bumps the generation and
//! drops every snapshot, and a pass that started before the bump cannot
//! store its (now outdated) result.

use alloy::primitives::Address;
use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::jobs::types::JobView;

/// One synchronized view.
#[derive(Debug, Clone)]
pub struct ViewSnapshot {
    pub jobs: Vec<JobView>,
    pub synced_at: SystemTime,
}

/// Snapshot store for the open-jobs view and per-account views.
#[derive(Debug, Default)]
pub struct ViewCache {
    open: ArcSwapOption<ViewSnapshot>,
    accounts: DashMap<Address, Arc<ViewSnapshot>>,
    generation: AtomicU64,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token to hand back to a `store_*` call when a pass finishes.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Store the open view unless the cache was invalidated since `generation`.
    pub fn store_open(&self, generation: u64, jobs: Vec<JobView>) -> bool {
        if generation != self.generation() {
            tracing::debug!("Discarding open-jobs view from an invalidated pass");
            return false;
        }
        self.open.store(Some(Arc::new(ViewSnapshot {
            jobs,
            synced_at: SystemTime::now(),
        })));
        true
    }

    pub fn store_account(&self, generation: u64, account: Address, jobs: Vec<JobView>) -> bool {
        if generation != self.generation() {
            tracing::debug!(account = %account, "Discarding account view from an invalidated pass");
            return false;
        }
        self.accounts.insert(
            account,
            Arc::new(ViewSnapshot {
                jobs,
                synced_at: SystemTime::now(),
            }),
        );
        true
    }

    pub fn open(&self) -> Option<Arc<ViewSnapshot>> {
        self.open.load_full()
    }

    pub fn account(&self, account: &Address) -> Option<Arc<ViewSnapshot>> {
        self.accounts.get(account).map(|entry| Arc::clone(entry.value()))
    }

    /// Drop every snapshot and fence off passes already in flight.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.open.store(None);
        self.accounts.clear();
    }

    /// True until a fresh open-jobs pass has been stored.
    pub fn is_stale(&self) -> bool {
        self.open.load().is_none()
    }
}
