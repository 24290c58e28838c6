//! Document-store indexers.
//!
//! Implementations of the `DocumentIndexer` port: an HTTP client for a
//! remote document store and an in-memory store used by tests and local
//! runs.

pub mod http;
pub mod memory;

pub use http::HttpIndexer;
pub use memory::MemoryIndexer;
