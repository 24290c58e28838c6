//! In-memory indexer.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use trawler_types::{CrawlError, DocumentIndexer};

/// Thread-safe in-memory document store.
///
/// Keeps every write keyed by index name, so tests can assert on call
/// counts and delivered payloads.
#[derive(Debug, Default)]
pub struct MemoryIndexer {
    documents: DashMap<String, Vec<(String, Value)>>,
    calls: AtomicUsize,
    fail_remaining: AtomicUsize,
}

impl MemoryIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` writes fail with an indexing error. Used by
    /// tests exercising retry and failure-threshold behavior.
    pub fn fail_next(&self, n: usize) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    /// Total `index_document` calls observed.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Documents written to an index, in arrival order.
    pub fn documents_in(&self, index: &str) -> Vec<(String, Value)> {
        self.documents
            .get(index)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    /// Look a single document up by index and ID.
    pub fn get(&self, index: &str, id: &str) -> Option<Value> {
        self.documents.get(index).and_then(|entry| {
            entry
                .iter()
                .rev()
                .find(|(doc_id, _)| doc_id == id)
                .map(|(_, payload)| payload.clone())
        })
    }
}

#[async_trait]
impl DocumentIndexer for MemoryIndexer {
    async fn index_document(
        &self,
        index: &str,
        id: &str,
        payload: Value,
    ) -> Result<(), CrawlError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(CrawlError::indexing("memory indexer forced failure"));
        }
        self.documents
            .entry(index.to_string())
            .or_default()
            .push((id.to_string(), payload));
        Ok(())
    }
}
