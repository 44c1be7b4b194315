//! In-process content store.

use alloy::primitives::{hex, keccak256};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::content::store::ContentStore;
use crate::error::{EngineError, EngineResult};

/// Content-addressed store held in memory.
///
/// Identifiers are derived from the payload hash, so publishing the same
/// bytes twice yields the same CID.
#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    blobs: DashMap<String, Vec<u8>>,
    unavailable: DashSet<String>,
    reject_puts: AtomicBool,
    gets: AtomicU64,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier this store assigns to `bytes`.
    pub fn cid_for(bytes: &[u8]) -> String {
        let hash = keccak256(bytes);
        format!("bafk{}", hex::encode(&hash[..20]))
    }

    /// Store bytes under an arbitrary identifier, bypassing hashing.
    pub fn insert_raw(&self, cid: &str, bytes: impl Into<Vec<u8>>) {
        self.blobs.insert(cid.to_string(), bytes.into());
    }

    /// Make reads of `cid` fail.
    pub fn make_unavailable(&self, cid: &str) {
        self.unavailable.insert(cid.to_string());
    }

    /// Make every publish fail.
    pub fn reject_puts(&self, reject: bool) {
        self.reject_puts.store(reject, Ordering::SeqCst);
    }

    pub fn get_calls(&self) -> u64 {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn get(&self, cid: &str) -> EngineResult<Vec<u8>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.contains(cid) {
            return Err(EngineError::content(cid, "gateway returned 504 Gateway Timeout"));
        }
        self.blobs
            .get(cid)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| EngineError::content(cid, "not found"))
    }

    async fn put(&self, _name: &str, bytes: Vec<u8>) -> EngineResult<String> {
        if self.reject_puts.load(Ordering::SeqCst) {
            return Err(EngineError::PublishFailed("upload rejected by store".into()));
        }
        let cid = Self::cid_for(&bytes);
        self.blobs.insert(cid.clone(), bytes);
        Ok(cid)
    }
}
