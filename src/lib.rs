//! Humanwork marketplace engine.
//!
//! Reconciles escrow records held on a ledger with job metadata held in a
//! content-addressed store, and submits the two escrow writes a client
//! performs (`createProject`, `approveWork`).

// Core subsystems
pub mod content;
pub mod jobs;
pub mod ledger;
pub mod marketplace;
pub mod wallet;

// Surfaces
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod observability;

pub use config::schema::EngineConfig;
pub use error::{EngineError, EngineResult, ErrorClass};
pub use http::ApiServer;
pub use jobs::{JobSynchronizer, JobView};
pub use ledger::{NetworkGuard, TransactionSubmitter};
pub use marketplace::{JobDraft, Marketplace, ProfileDraft};
