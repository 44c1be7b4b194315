//! Jobs subsystem: domain types, synchronization passes and view caching.
//!
//! # Data Flow
//! ```text
//! caller triggers a pass
//!     → NetworkGuard (chain id check)
//!     → LedgerReader::count, then get(0..count) concurrently
//!     → filter (open / by client)
//!     → ContentResolver (metadata or placeholder)
//!     → Vec<JobView> ascending by project id
//!     → ViewCache snapshot
//! ```

pub mod cache;
pub mod sync;
pub mod types;

pub use cache::{ViewCache, ViewSnapshot};
pub use sync::JobSynchronizer;
pub use types::{
    JobMetadata, JobView, ProfilePayload, ProjectRecord, ProjectStatus, NOT_AVAILABLE,
};
