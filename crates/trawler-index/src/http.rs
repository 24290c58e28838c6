//! HTTP document-store indexer.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use trawler_types::{CrawlError, DocumentIndexer};

/// Indexer speaking the document store's HTTP API.
///
/// Writes `PUT {base}/{index}/_doc/{id}` with a JSON body. Any non-2xx
/// response is an indexing error; retrying is the pipeline's decision.
#[derive(Debug)]
pub struct HttpIndexer {
    client: Client,
    base_url: String,
}

impl HttpIndexer {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CrawlError::configuration(format!("cannot build indexer client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DocumentIndexer for HttpIndexer {
    async fn index_document(
        &self,
        index: &str,
        id: &str,
        payload: Value,
    ) -> Result<(), CrawlError> {
        let endpoint = format!("{}/{}/_doc/{}", self.base_url, index, id);
        let response = self
            .client
            .put(&endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CrawlError::timeout(format!("index write to {}", endpoint))
                } else {
                    CrawlError::indexing(format!("write to {} failed: {}", endpoint, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::indexing(format!(
                "store returned {} for {}",
                status, endpoint
            )));
        }
        debug!(index = %index, id = %id, "Indexed document");
        Ok(())
    }
}
