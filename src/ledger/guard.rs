//! Network identity gate.
//!
//! Every read pass and every write checks the active chain first. A mismatch
//! short-circuits the operation before any record is read or any transaction
//! is built.

use crate::error::{EngineError, EngineResult};
use crate::ledger::reader::LedgerReader;
use crate::ledger::types::ChainId;
use crate::wallet::signer::WalletSigner;

/// Rejects work on any network other than the configured one.
#[derive(Debug, Clone, Copy)]
pub struct NetworkGuard {
    expected: ChainId,
}

impl NetworkGuard {
    pub fn new(expected: impl Into<ChainId>) -> Self {
        Self {
            expected: expected.into(),
        }
    }

    pub fn expected(&self) -> ChainId {
        self.expected
    }

    /// Compare an already-known network identity.
    pub fn verify(&self, active: ChainId) -> EngineResult<()> {
        if active != self.expected {
            tracing::warn!(
                expected = %self.expected,
                actual = %active,
                "Refusing to operate on unexpected network"
            );
            return Err(EngineError::NetworkMismatch {
                expected: self.expected.0,
                actual: active.0,
            });
        }
        Ok(())
    }

    /// Query the ledger's network and verify it.
    pub async fn check_ledger(&self, ledger: &dyn LedgerReader) -> EngineResult<()> {
        let active = ledger.chain_id().await?;
        self.verify(active)
    }

    /// Query the signer's network and verify it.
    pub async fn check_signer(&self, signer: &dyn WalletSigner) -> EngineResult<()> {
        let active = signer.chain_id().await?;
        self.verify(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_matching_network() {
        let guard = NetworkGuard::new(296);
        assert!(guard.verify(ChainId(296)).is_ok());
    }

    #[test]
    fn test_verify_mismatch() {
        let guard = NetworkGuard::new(296);
        let err = guard.verify(ChainId(1)).unwrap_err();
        assert_eq!(
            err,
            EngineError::NetworkMismatch {
                expected: 296,
                actual: 1
            }
        );
    }
}
