//! Content store boundary.

use async_trait::async_trait;

use crate::error::EngineResult;

/// Key-addressed storage keyed by content identifier.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Raw bytes stored under `cid`. Fails with `ContentUnavailable`.
    async fn get(&self, cid: &str) -> EngineResult<Vec<u8>>;

    /// Store `bytes` and return the identifier the store assigned.
    /// Fails with `PublishFailed`.
    async fn put(&self, name: &str, bytes: Vec<u8>) -> EngineResult<String>;
}
