//! Engine-wide error taxonomy.
//!
//! Content resolution failures are the only class recovered inside the
//! engine (they degrade to placeholder metadata). Everything else reaches the
//! caller as one of these variants.

use thiserror::Error;

/// Errors surfaced by the reconciliation and submission engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The active ledger network is not the one this deployment expects.
    #[error("Network mismatch: expected chain ID {expected}, got {actual}")]
    NetworkMismatch { expected: u64, actual: u64 },

    /// Record enumeration or fetch failed.
    #[error("Ledger call failed{}: {reason}", project_suffix(.project_id))]
    LedgerCall {
        project_id: Option<u64>,
        reason: String,
    },

    /// Metadata for a content identifier could not be resolved.
    #[error("Content unavailable for '{cid}': {reason}")]
    ContentUnavailable { cid: String, reason: String },

    /// Publishing a payload to the content store failed.
    #[error("Content publish failed: {0}")]
    PublishFailed(String),

    /// A write was attempted without a connected account.
    #[error("No active account connected")]
    NoActiveAccount,

    /// The signer declined or the ledger reverted the transaction.
    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),

    /// Malformed input to a write operation.
    #[error("Invalid input: {0}")]
    Validation(String),
}

fn project_suffix(project_id: &Option<u64>) -> String {
    match project_id {
        Some(id) => format!(" for project {}", id),
        None => String::new(),
    }
}

/// Coarse classification telling a caller what to do about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Switch the wallet/provider to the expected network.
    WrongNetwork,
    /// Transient ledger or content-store trouble; try again later.
    RetryLater,
    /// The request itself is wrong (bad input, no account).
    FixInput,
    /// The user or the ledger refused the transaction.
    UserDeclined,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::WrongNetwork => "wrong_network",
            ErrorClass::RetryLater => "retry_later",
            ErrorClass::FixInput => "fix_input",
            ErrorClass::UserDeclined => "user_declined",
        }
    }
}

impl EngineError {
    /// Shorthand for a ledger failure tied to one record.
    pub fn ledger(project_id: u64, reason: impl Into<String>) -> Self {
        Self::LedgerCall {
            project_id: Some(project_id),
            reason: reason.into(),
        }
    }

    /// Shorthand for a ledger failure not tied to a record.
    pub fn ledger_call(reason: impl Into<String>) -> Self {
        Self::LedgerCall {
            project_id: None,
            reason: reason.into(),
        }
    }

    /// Shorthand for a content failure.
    pub fn content(cid: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ContentUnavailable {
            cid: cid.into(),
            reason: reason.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            EngineError::NetworkMismatch { .. } => ErrorClass::WrongNetwork,
            EngineError::LedgerCall { .. }
            | EngineError::ContentUnavailable { .. }
            | EngineError::PublishFailed(_) => ErrorClass::RetryLater,
            EngineError::NoActiveAccount | EngineError::Validation(_) => ErrorClass::FixInput,
            EngineError::TransactionRejected(_) => ErrorClass::UserDeclined,
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::NetworkMismatch {
            expected: 296,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "Network mismatch: expected chain ID 296, got 1"
        );

        let err = EngineError::ledger(3, "execution reverted");
        assert_eq!(
            err.to_string(),
            "Ledger call failed for project 3: execution reverted"
        );

        let err = EngineError::ledger_call("timeout");
        assert_eq!(err.to_string(), "Ledger call failed: timeout");
    }

    #[test]
    fn test_error_classes() {
        assert_eq!(
            EngineError::ledger_call("x").class(),
            ErrorClass::RetryLater
        );
        assert_eq!(
            EngineError::Validation("budget".into()).class(),
            ErrorClass::FixInput
        );
        assert_eq!(EngineError::NoActiveAccount.class(), ErrorClass::FixInput);
        assert_eq!(
            EngineError::PublishFailed("503".into()).class(),
            ErrorClass::RetryLater
        );
        assert_eq!(
            EngineError::TransactionRejected("user denied".into()).class(),
            ErrorClass::UserDeclined
        );
        assert_eq!(
            EngineError::NetworkMismatch {
                expected: 296,
                actual: 1
            }
            .class(),
            ErrorClass::WrongNetwork
        );
    }
}
