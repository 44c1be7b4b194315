//! Read boundary of the escrow ledger.

use async_trait::async_trait;

use crate::error::EngineResult;
use crate::jobs::types::ProjectRecord;
use crate::ledger::types::ChainId;

/// Enumerates and fetches project records.
///
/// Fetches for different ids are independent and may run concurrently.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Identity of the network the reader is connected to.
    async fn chain_id(&self) -> EngineResult<ChainId>;

    /// Total number of projects ever created. Never decreases.
    async fn count(&self) -> EngineResult<u64>;

    /// Fetch one record. Out-of-range ids fail with `LedgerCall`.
    async fn get(&self, project_id: u64) -> EngineResult<ProjectRecord>;
}
