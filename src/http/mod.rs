//! Read-only HTTP API.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → handlers.rs (GET /health, /jobs, /accounts/{account}/jobs)
//!     → JobSynchronizer pass (or cached snapshot)
//!     → JSON response; engine errors mapped to 409 / 502 / 400
//! ```

pub mod handlers;
pub mod request;
pub mod server;

pub use handlers::{ApiError, ApiState, JobsResponse};
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::ApiServer;
