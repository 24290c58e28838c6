//! Port to the external document store.

use crate::errors::CrawlError;
use async_trait::async_trait;

/// Writes extracted records into the document store.
///
/// Implementations must be safe for concurrent use. The crawler treats any
/// error as retryable unless it is a cancellation.
#[async_trait]
pub trait DocumentIndexer: Send + Sync {
    /// Persist `payload` under `id` in the named index.
    async fn index_document(
        &self,
        index: &str,
        id: &str,
        payload: serde_json::Value,
    ) -> Result<(), CrawlError>;
}
