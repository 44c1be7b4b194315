//! Wallet signer boundary.
//!
//! Signing authority lives outside the engine. The engine hands a
//! [`TransactionIntent`] to whichever [`WalletSigner`] is connected and gets a
//! receipt back once the ledger has included the transaction.

use alloy::primitives::{Address, Bytes, Log, TxHash, U256};
use async_trait::async_trait;

use crate::error::EngineResult;
use crate::ledger::types::ChainId;

/// An unsigned state-changing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIntent {
    /// Account expected to sign.
    pub from: Address,
    pub to: Address,
    /// Native value attached (wei).
    pub value: U256,
    pub input: Bytes,
}

/// Outcome of an included transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    /// False when the ledger reverted the call.
    pub success: bool,
    pub logs: Vec<Log>,
}

/// External component holding signing authority for one or more accounts.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Accounts the signer is willing to act for. Empty when disconnected.
    async fn request_accounts(&self) -> EngineResult<Vec<Address>>;

    /// Network the signer submits to.
    async fn chain_id(&self) -> EngineResult<ChainId>;

    /// Sign and submit, then wait until the ledger includes the transaction.
    ///
    /// Fails with `TransactionRejected` when the signer declines or the
    /// ledger refuses the call outright. There is no built-in deadline.
    async fn send(&self, intent: TransactionIntent) -> EngineResult<TxReceipt>;
}
