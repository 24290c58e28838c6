//! Error types for the Trawler crawler.

use thiserror::Error;

/// Errors produced by the crawling pipeline.
///
/// Variants map one-to-one onto the failure classes the pipeline
/// distinguishes: configuration and validation problems are surfaced and
/// never retried, transient fetch and indexing failures are retried with
/// backoff, permanent fetch failures skip the URL, and cancellation is
/// propagated unchanged so the coordinator can mark the job `stopped`
/// rather than `failed`.
#[derive(Error, Debug)]
pub enum CrawlError {
    /// Malformed source definition or unknown source name.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Invalid job or item shape.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Network failure or 5xx response; retryable.
    #[error("transient fetch error: {message}")]
    TransientFetch { message: String },

    /// 4xx response other than 429; the URL is skipped.
    #[error("permanent fetch error ({status:?}): {message}")]
    PermanentFetch { message: String, status: Option<u16> },

    /// Selector yielded an unparseable structure; the URL is skipped.
    #[error("extraction error: {message}")]
    Extraction { message: String },

    /// The document store rejected a write; retryable.
    #[error("indexing error: {message}")]
    Indexing { message: String },

    /// The job's cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,

    /// A bounded operation ran out of time.
    #[error("timeout during {operation}")]
    Timeout { operation: String },
}

impl CrawlError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Validation error for a disallowed job state transition.
    pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        Self::Validation {
            message: format!("invalid state transition from {} to {}", from, to),
        }
    }

    pub fn transient_fetch(message: impl Into<String>) -> Self {
        Self::TransientFetch {
            message: message.into(),
        }
    }

    pub fn permanent_fetch(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::PermanentFetch {
            message: message.into(),
            status,
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    pub fn indexing(message: impl Into<String>) -> Self {
        Self::Indexing {
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Whether the failure may succeed on a later attempt.
    ///
    /// Timeouts count as retryable because they wrap into the transient
    /// fetch or indexing class depending on where they were observed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CrawlError::TransientFetch { .. }
                | CrawlError::Indexing { .. }
                | CrawlError::Timeout { .. }
        )
    }

    /// Whether this error is a cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CrawlError::Cancelled)
    }
}
