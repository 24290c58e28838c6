//! The content-processing pipeline core.
//!
//! This crate binds the pieces together: the job coordinator owns job
//! lifecycles and cancellation tokens, the processor registry routes
//! classified pages to the matching processor, and the crawl service runs
//! fetched documents through detection, extraction, and indexing while
//! enforcing at-most-once delivery per URL and the indexing failure
//! threshold.

pub mod coordinator;
pub mod dedup;
pub mod failure;
pub mod processors;
pub mod registry;
pub mod service;

pub use coordinator::JobCoordinator;
pub use dedup::InFlightSet;
pub use failure::FailureWindow;
pub use processors::{ArticleProcessor, PageProcessor, Processor, ProcessorInput};
pub use registry::ProcessorRegistry;
pub use service::CrawlService;
