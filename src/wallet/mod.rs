//! Wallet signer subsystem.
//!
//! # Data Flow
//! ```text
//! TransactionSubmitter builds a TransactionIntent
//!     → signer.rs (WalletSigner boundary)
//!     → local.rs (private key from env, sign, broadcast, wait for receipt)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data

pub mod local;
pub mod signer;

pub use local::LocalWallet;
pub use signer::{TransactionIntent, TxReceipt, WalletSigner};
