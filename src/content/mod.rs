//! Off-ledger content: job descriptions and profiles addressed by CID.
//!
//! [`ContentStore`] is the raw byte boundary (HTTP gateway or in-memory);
//! [`ContentResolver`] layers JSON parsing, caching and placeholder
//! degradation on top of it.

pub mod http;
pub mod memory;
pub mod resolver;
pub mod store;

pub use http::{HttpContentStore, CONTENT_TOKEN_ENV_VAR};
pub use memory::InMemoryContentStore;
pub use resolver::ContentResolver;
pub use store::ContentStore;
