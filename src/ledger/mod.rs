//! Escrow ledger subsystem.
//!
//! # Data Flow
//! ```text
//! reads:  NetworkGuard → LedgerReader (rpc.rs with failover, or memory.rs)
//!         → contract.rs (ABI decode) → ProjectRecord
//! writes: TransactionSubmitter → NetworkGuard → contract.rs (ABI encode)
//!         → WalletSigner::send → receipt → view invalidation
//! ```

pub mod contract;
pub mod guard;
pub mod memory;
pub mod reader;
pub mod rpc;
pub mod transaction;
pub mod types;

pub use guard::NetworkGuard;
pub use memory::InMemoryLedger;
pub use reader::LedgerReader;
pub use rpc::RpcLedger;
pub use transaction::{CreatedProject, TransactionSubmitter};
pub use types::ChainId;
