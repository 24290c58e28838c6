//! Core data model for the Trawler crawler.
//!
//! This crate holds the types shared by every other Trawler crate: content
//! classification, extracted records, job lifecycle, events, errors, and the
//! indexer port. It deliberately has no I/O of its own.

pub mod content;
pub mod errors;
pub mod event;
pub mod fingerprint;
pub mod indexer;
pub mod item;
pub mod job;
pub mod records;

pub use content::ContentType;
pub use errors::CrawlError;
pub use event::{EventKind, JobEvent};
pub use fingerprint::url_fingerprint;
pub use indexer::DocumentIndexer;
pub use item::{Item, ItemState};
pub use job::{Job, JobState, JobStatus};
pub use records::{Article, Page};

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CrawlError>;
