//! State-changing escrow calls.
//!
//! # Responsibilities
//! - Reject writes with no active account before any network call
//! - Check the signer's network before building a transaction
//! - Hand the intent to the wallet signer and await inclusion
//! - Invalidate synchronized views after a write that succeeded

use alloy::primitives::{Address, TxHash, U256};
use std::sync::Arc;

use crate::error::{EngineError, EngineResult};
use crate::jobs::sync::JobSynchronizer;
use crate::ledger::contract;
use crate::ledger::guard::NetworkGuard;
use crate::ledger::reader::LedgerReader;
use crate::observability::metrics;
use crate::wallet::signer::{TransactionIntent, TxReceipt, WalletSigner};

/// A confirmed `createProject`.
///
/// `project_id` is `None` when the receipt carried no `ProjectCreated` event
/// and the id could not be read back afterwards. The escrow exists either
/// way; callers must not resubmit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedProject {
    pub project_id: Option<u64>,
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
}

/// Submits `createProject` and `approveWork` through a wallet signer.
#[derive(Clone)]
pub struct TransactionSubmitter {
    signer: Arc<dyn WalletSigner>,
    ledger: Arc<dyn LedgerReader>,
    synchronizer: JobSynchronizer,
    guard: NetworkGuard,
    escrow: Address,
}

impl TransactionSubmitter {
    pub fn new(
        signer: Arc<dyn WalletSigner>,
        ledger: Arc<dyn LedgerReader>,
        synchronizer: JobSynchronizer,
        escrow: Address,
    ) -> Self {
        let guard = synchronizer.guard();
        Self {
            signer,
            ledger,
            synchronizer,
            guard,
            escrow,
        }
    }

    /// Escrow `amount` for a new project and return it once confirmed.
    ///
    /// `freelancer` may be the zero address when nobody is assigned yet.
    /// Errors are only returned before or during submission, never after
    /// the ledger has included the transaction.
    pub async fn create_project(
        &self,
        account: Option<Address>,
        freelancer: Address,
        description_cid: &str,
        deadline: u64,
        amount: U256,
    ) -> EngineResult<CreatedProject> {
        let from = account.ok_or(EngineError::NoActiveAccount)?;
        if description_cid.trim().is_empty() {
            return Err(EngineError::Validation(
                "description CID must not be empty".to_string(),
            ));
        }
        if deadline == 0 {
            return Err(EngineError::Validation("deadline must be set".to_string()));
        }

        let intent = TransactionIntent {
            from,
            to: self.escrow,
            value: amount,
            input: contract::encode_create(freelancer, description_cid, deadline),
        };
        let receipt = self.submit("create_project", intent).await?;

        let project_id = match contract::created_project_id(self.escrow, &receipt.logs) {
            Some(id) => Some(id),
            None => self.read_back_id(&receipt).await,
        };

        tracing::info!(
            project_id = ?project_id,
            client = %from,
            amount = %amount,
            tx_hash = %receipt.tx_hash,
            "Project created"
        );
        Ok(CreatedProject {
            project_id,
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
        })
    }

    /// Best-effort id lookup for a receipt without the creation event.
    async fn read_back_id(&self, receipt: &TxReceipt) -> Option<u64> {
        tracing::warn!(tx_hash = %receipt.tx_hash, "No ProjectCreated event in receipt, reading count");
        match self.ledger.count().await {
            Ok(count) => count.checked_sub(1),
            Err(e) => {
                tracing::warn!(
                    tx_hash = %receipt.tx_hash,
                    error = %e,
                    "Project id unknown after confirmed create"
                );
                None
            }
        }
    }

    /// Approve submitted work, releasing the escrow to the freelancer.
    ///
    /// Client identity and the `WorkSubmitted` precondition are enforced by
    /// the ledger; a refusal surfaces as `TransactionRejected`.
    pub async fn approve_work(
        &self,
        account: Option<Address>,
        project_id: u64,
    ) -> EngineResult<TxReceipt> {
        let from = account.ok_or(EngineError::NoActiveAccount)?;

        let intent = TransactionIntent {
            from,
            to: self.escrow,
            value: U256::ZERO,
            input: contract::encode_approve(project_id),
        };
        let receipt = self.submit("approve_work", intent).await?;

        tracing::info!(
            project_id = project_id,
            client = %from,
            tx_hash = %receipt.tx_hash,
            "Work approved"
        );
        Ok(receipt)
    }

    /// Fail with `NetworkMismatch` unless the signer is on the expected
    /// network. Workflows that write elsewhere before submitting call this
    /// first.
    pub async fn check_network(&self) -> EngineResult<()> {
        self.guard.check_signer(self.signer.as_ref()).await
    }

    async fn submit(&self, kind: &'static str, intent: TransactionIntent) -> EngineResult<TxReceipt> {
        self.check_network().await?;

        tracing::debug!(kind = kind, from = %intent.from, value = %intent.value, "Submitting transaction");
        let result = self.signer.send(intent).await.and_then(|receipt| {
            if receipt.success {
                Ok(receipt)
            } else {
                Err(EngineError::TransactionRejected(format!(
                    "transaction {} reverted",
                    receipt.tx_hash
                )))
            }
        });

        metrics::record_transaction(kind, result.is_ok());
        match &result {
            Ok(_) => self.synchronizer.invalidate(),
            Err(e) => tracing::warn!(kind = kind, error = %e, "Transaction failed"),
        }
        result
    }
}

impl std::fmt::Debug for TransactionSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionSubmitter")
            .field("escrow", &self.escrow)
            .field("guard", &self.guard)
            .finish()
    }
}
