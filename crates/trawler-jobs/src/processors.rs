//! Content processors.

use async_trait::async_trait;
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use trawler_config::{CrawlerDefaults, Source, SourceRegistry};
use trawler_extraction::{article::extract_article, page::extract_page};
use trawler_types::{
    ContentType, CrawlError, DocumentIndexer, Item, ItemState, Job,
};

/// Input routed through a processor.
#[derive(Debug, Clone)]
pub enum ProcessorInput {
    /// A fetched document with its detected content type.
    Html {
        url: String,
        html: String,
        content_type: ContentType,
    },
    /// A bare job, used for validation-only dispatch.
    Job(Job),
}

impl ProcessorInput {
    pub fn content_type(&self) -> ContentType {
        match self {
            ProcessorInput::Html { content_type, .. } => *content_type,
            ProcessorInput::Job(job) => job.content_type,
        }
    }
}

/// One content-type's processing capability.
///
/// `start`/`stop` bracket processor-local resources; `validate_job`
/// guards the job shape and `can_process` guards the input shape before
/// `process` extracts, normalizes, and indexes.
#[async_trait]
pub trait Processor: Send + Sync {
    fn content_type(&self) -> ContentType;

    fn can_process(&self, input: &ProcessorInput) -> bool {
        matches!(input, ProcessorInput::Html { .. }) && input.content_type() == self.content_type()
    }

    async fn process(&self, job: &Job, input: ProcessorInput) -> Result<Item, CrawlError>;

    async fn start(&self) -> Result<(), CrawlError> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), CrawlError> {
        Ok(())
    }

    fn validate_job(&self, job: Option<&Job>) -> Result<(), CrawlError> {
        let job = job.ok_or_else(|| CrawlError::validation("job is required"))?;
        if job.source_name.trim().is_empty() {
            return Err(CrawlError::validation(format!(
                "job {} has no source name",
                job.id
            )));
        }
        Ok(())
    }
}

/// Shared indexing path: serialize, write with retries, emit the item.
async fn deliver(
    indexer: &Arc<dyn DocumentIndexer>,
    defaults: &CrawlerDefaults,
    job: &Job,
    url: &str,
    index_name: &str,
    id: &str,
    payload: serde_json::Value,
) -> Result<Item, CrawlError> {
    let content = payload.to_string();
    let mut last_error = CrawlError::indexing(format!("no attempts made for {}", url));
    let attempts = defaults.max_retries.max(1);

    for attempt in 0..attempts {
        let write = tokio::time::timeout(
            defaults.operation_timeout,
            indexer.index_document(index_name, id, payload.clone()),
        )
        .await
        .unwrap_or_else(|_| Err(CrawlError::timeout(format!("index write for {}", url))));

        match write {
            Ok(()) => {
                debug!(job_id = %job.id, url = %url, index = %index_name, "Document indexed");
                return Ok(Item::new(id, &job.id, url, content.clone(), ItemState::Indexed));
            }
            Err(err) if err.is_cancelled() => return Err(err),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => {
                warn!(job_id = %job.id, url = %url, attempt = attempt + 1, error = %err, "Index write failed");
                last_error = err;
            }
        }

        if attempt + 1 < attempts {
            tokio::time::sleep(backoff_delay(defaults.rate_limit, attempt)).await;
        }
    }

    let failed = Item::new(id, &job.id, url, content, ItemState::Failed);
    debug!(job_id = %job.id, url = %failed.url, "Item delivery failed");
    Err(last_error)
}

fn backoff_delay(rate_limit: Duration, attempt: u32) -> Duration {
    let base = rate_limit.max(Duration::from_millis(50));
    base.saturating_mul(attempt + 1)
}

fn html_input(input: ProcessorInput) -> Result<(String, String), CrawlError> {
    match input {
        ProcessorInput::Html { url, html, .. } => {
            if url.trim().is_empty() {
                return Err(CrawlError::validation("input URL is empty"));
            }
            Ok((url, html))
        }
        ProcessorInput::Job(job) => Err(CrawlError::validation(format!(
            "job {} is not processable content",
            job.id
        ))),
    }
}

/// Extracts and indexes articles.
pub struct ArticleProcessor {
    indexer: Arc<dyn DocumentIndexer>,
    sources: Arc<SourceRegistry>,
    defaults: CrawlerDefaults,
    default_index: String,
}

impl ArticleProcessor {
    pub fn new(
        indexer: Arc<dyn DocumentIndexer>,
        sources: Arc<SourceRegistry>,
        defaults: CrawlerDefaults,
        default_index: impl Into<String>,
    ) -> Self {
        Self {
            indexer,
            sources,
            defaults,
            default_index: default_index.into(),
        }
    }

    fn source_for(&self, job: &Job) -> Option<&Source> {
        self.sources.find_by_name(&job.source_name)
    }
}

#[async_trait]
impl Processor for ArticleProcessor {
    fn content_type(&self) -> ContentType {
        ContentType::Article
    }

    async fn process(&self, job: &Job, input: ProcessorInput) -> Result<Item, CrawlError> {
        self.validate_job(Some(job))?;
        if !self.can_process(&input) {
            return Err(CrawlError::validation(format!(
                "article processor cannot handle {} input",
                input.content_type()
            )));
        }
        let (url, html) = html_input(input)?;

        let source = self.source_for(job);
        let selectors = source
            .map(|s| s.article_selectors.clone())
            .unwrap_or_default();

        let mut article = {
            let document = Html::parse_document(&html);
            extract_article(&document, &url, &selectors)
        };
        article.prepare_for_indexing();

        let index_name = source
            .and_then(|s| s.index_for(ContentType::Article))
            .unwrap_or(&self.default_index)
            .to_string();
        let id = article.id.clone();
        let payload = serde_json::to_value(&article)
            .map_err(|e| CrawlError::extraction(format!("article for {} unserializable: {}", url, e)))?;

        deliver(&self.indexer, &self.defaults, job, &url, &index_name, &id, payload).await
    }
}

/// Extracts and indexes generic pages.
pub struct PageProcessor {
    indexer: Arc<dyn DocumentIndexer>,
    sources: Arc<SourceRegistry>,
    defaults: CrawlerDefaults,
    default_index: String,
}

impl PageProcessor {
    pub fn new(
        indexer: Arc<dyn DocumentIndexer>,
        sources: Arc<SourceRegistry>,
        defaults: CrawlerDefaults,
        default_index: impl Into<String>,
    ) -> Self {
        Self {
            indexer,
            sources,
            defaults,
            default_index: default_index.into(),
        }
    }
}

#[async_trait]
impl Processor for PageProcessor {
    fn content_type(&self) -> ContentType {
        ContentType::Page
    }

    async fn process(&self, job: &Job, input: ProcessorInput) -> Result<Item, CrawlError> {
        self.validate_job(Some(job))?;
        if !self.can_process(&input) {
            return Err(CrawlError::validation(format!(
                "page processor cannot handle {} input",
                input.content_type()
            )));
        }
        let (url, html) = html_input(input)?;

        // the index is resolved from the URL's owning source when one
        // matches, so cross-source pages land in the right index
        let source = self
            .sources
            .find_by_url(&url)
            .or_else(|| self.sources.find_by_name(&job.source_name));
        let selectors = source.map(|s| s.page_selectors.clone()).unwrap_or_default();

        let mut page = {
            let document = Html::parse_document(&html);
            extract_page(&document, &url, &selectors)
        };
        page.prepare_for_indexing();

        let index_name = source
            .and_then(|s| s.index_for(ContentType::Page))
            .unwrap_or(&self.default_index)
            .to_string();
        let id = page.id.clone();
        let payload = serde_json::to_value(&page)
            .map_err(|e| CrawlError::extraction(format!("page for {} unserializable: {}", url, e)))?;

        deliver(&self.indexer, &self.defaults, job, &url, &index_name, &id, payload).await
    }
}
