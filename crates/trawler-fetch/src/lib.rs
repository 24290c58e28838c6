//! Fetch driver for the Trawler crawler.
//!
//! Dispatches HTTP GETs per source, honouring rate limits, depth, and
//! allowed-domain constraints, and emits fetched HTML documents to the
//! processing pipeline. Reliability is retry-with-backoff only; anything
//! smarter belongs to the collaborating services.

pub mod client;
pub mod driver;
pub mod limiter;

pub use client::{FetchClient, RetryConfig};
pub use driver::{discover_links, FetchDriver, FetchedPage, HttpFetchDriver};
pub use limiter::RateLimiter;
