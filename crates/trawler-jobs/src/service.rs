//! The crawl service: fetch → detect → extract → index.

use scraper::Html;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use trawler_config::{CrawlerDefaults, SourceRegistry};
use trawler_extraction::{detect_document, extract_metadata};
use trawler_fetch::{FetchDriver, FetchedPage};
use trawler_types::{ContentType, CrawlError, Job};

use crate::coordinator::JobCoordinator;
use crate::dedup::InFlightSet;
use crate::failure::FailureWindow;
use crate::processors::ProcessorInput;
use crate::registry::ProcessorRegistry;

/// Runs jobs end to end.
///
/// For each job the service consumes the fetch driver's page stream,
/// claims every URL exactly once, classifies it, routes it to the
/// registered processor, and reports progress. The coordinator remains
/// the only component deciding terminal job state.
#[derive(Clone)]
pub struct CrawlService {
    coordinator: Arc<JobCoordinator>,
    sources: Arc<SourceRegistry>,
    registry: Arc<ProcessorRegistry>,
    driver: Arc<dyn FetchDriver>,
    defaults: CrawlerDefaults,
}

impl CrawlService {
    pub fn new(
        coordinator: Arc<JobCoordinator>,
        sources: Arc<SourceRegistry>,
        registry: Arc<ProcessorRegistry>,
        driver: Arc<dyn FetchDriver>,
        defaults: CrawlerDefaults,
    ) -> Self {
        Self {
            coordinator,
            sources,
            registry,
            driver,
            defaults,
        }
    }

    pub fn coordinator(&self) -> &Arc<JobCoordinator> {
        &self.coordinator
    }

    /// Start a job for a source and run it in the background.
    ///
    /// Returns the running job snapshot and the handle of the task that
    /// drives it to a terminal state.
    pub async fn start_crawl(
        &self,
        source_name: &str,
        content_type: ContentType,
    ) -> Result<(Job, JoinHandle<()>), CrawlError> {
        let job = self.coordinator.start(source_name, content_type).await?;
        let service = self.clone();
        let job_clone = job.clone();
        let handle = tokio::spawn(async move {
            service.run_job(job_clone).await;
        });
        Ok((job, handle))
    }

    async fn run_job(&self, job: Job) {
        let Some(source) = self.sources.find_by_name(&job.source_name).cloned() else {
            // start() verified the source; a vanished source is a bug
            let _ = self
                .coordinator
                .fail(&job.id, format!("source '{}' disappeared", job.source_name))
                .await;
            return;
        };
        let token = match self.coordinator.token(&job.id) {
            Ok(token) => token,
            Err(_) => return,
        };

        let (tx, mut rx) = mpsc::channel::<FetchedPage>(self.defaults.buffer_size.max(1));
        let driver = self.driver.clone();
        let driver_source = source.clone();
        let driver_token = token.clone();
        let driver_handle: JoinHandle<Result<(), CrawlError>> =
            tokio::spawn(async move { driver.crawl(&driver_source, &driver_token, tx).await });

        let patterns = source.content_type_patterns();
        let expected_total = if source.seed_urls.is_empty() {
            None
        } else {
            Some(1 + source.seed_urls.len())
        };
        let in_flight = InFlightSet::new();
        let window = FailureWindow::new();
        let mut dispatched: usize = 0;
        let mut processed: usize = 0;
        let mut aborted = false;

        while let Some(page) = rx.recv().await {
            if token.is_cancelled() {
                aborted = true;
                break;
            }
            dispatched += 1;

            if !in_flight.try_claim(&page.url) {
                debug!(job_id = %job.id, url = %page.url, "Duplicate URL skipped");
                continue;
            }

            // CPU-only classification; the parsed document never crosses
            // an await point
            let content_type = {
                let document = Html::parse_document(&page.html);
                let metadata = extract_metadata(&document, &source.metadata_selectors);
                detect_document(&document, &page.url, &metadata, &patterns)
            };

            if self.registry.get(content_type).is_none() {
                warn!(
                    job_id = %job.id,
                    url = %page.url,
                    content_type = %content_type,
                    "No processor registered, dropping page"
                );
                processed += 1;
                continue;
            }

            let input = ProcessorInput::Html {
                url: page.url.clone(),
                html: page.html,
                content_type,
            };
            let outcome = self
                .registry
                .process_content(&job, content_type, input)
                .await;
            processed += 1;

            match outcome {
                Ok(item) => {
                    debug!(job_id = %job.id, url = %item.url, "Item indexed");
                    window.record(true);
                }
                Err(err) if err.is_cancelled() => {
                    aborted = true;
                    break;
                }
                Err(err @ (CrawlError::Indexing { .. } | CrawlError::Timeout { .. })) => {
                    warn!(job_id = %job.id, url = %page.url, error = %err, "Indexing failed, skipping URL");
                    if window.record(false) {
                        let _ = self
                            .coordinator
                            .fail(
                                &job.id,
                                "indexing failure rate exceeded 50% over the last 20 attempts",
                            )
                            .await;
                        token.cancel();
                        aborted = true;
                        break;
                    }
                }
                Err(err) => {
                    // extraction and validation problems skip the URL
                    warn!(job_id = %job.id, url = %page.url, error = %err, "Skipping URL");
                }
            }

            let percent = progress_percent(processed, dispatched, expected_total);
            let _ = self.coordinator.report_progress(&job.id, percent).await;
        }

        // closing the channel unblocks a driver mid-send
        drop(rx);
        let driver_result = driver_handle.await;
        if aborted {
            // terminal state was already decided (stop or threshold fail)
            return;
        }

        match driver_result {
            Ok(Ok(())) => {
                if self.coordinator.complete(&job.id).await.is_err() {
                    debug!(job_id = %job.id, "Job already terminal at completion");
                }
            }
            Ok(Err(err)) if err.is_cancelled() => {
                // stop() already published the terminal event
                info!(job_id = %job.id, "Crawl cancelled");
            }
            Ok(Err(err)) => {
                let _ = self.coordinator.fail(&job.id, err.to_string()).await;
            }
            Err(join_err) => {
                let _ = self
                    .coordinator
                    .fail(&job.id, format!("fetch driver panicked: {}", join_err))
                    .await;
            }
        }
    }
}

/// Progress estimate in `[0, 99]`; 100 is reserved for completion.
fn progress_percent(processed: usize, dispatched: usize, expected_total: Option<usize>) -> u8 {
    let ratio = match expected_total {
        Some(total) if total > 0 => processed * 100 / total,
        _ => processed * 100 / dispatched.max(1),
    };
    ratio.min(99) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use trawler_config::{parse_sources, Source};
    use trawler_events::{EventBus, EventHandler};
    use trawler_index::MemoryIndexer;
    use trawler_types::{EventKind, JobEvent, JobState};

    use crate::processors::{ArticleProcessor, PageProcessor};

    /// Driver that replays a scripted page list.
    struct ScriptedDriver {
        pages: Vec<FetchedPage>,
        page_delay: Duration,
    }

    #[async_trait]
    impl FetchDriver for ScriptedDriver {
        async fn crawl(
            &self,
            _source: &Source,
            token: &CancellationToken,
            pages: mpsc::Sender<FetchedPage>,
        ) -> Result<(), CrawlError> {
            for page in &self.pages {
                if !self.page_delay.is_zero() {
                    tokio::time::sleep(self.page_delay).await;
                }
                if token.is_cancelled() {
                    return Err(CrawlError::Cancelled);
                }
                if pages.send(page.clone()).await.is_err() {
                    return Err(CrawlError::Cancelled);
                }
            }
            Ok(())
        }
    }

    struct Recorder {
        events: Arc<StdMutex<Vec<JobEvent>>>,
    }

    #[async_trait]
    impl EventHandler for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn handle(&self, event: &JobEvent) -> Result<(), CrawlError> {
            self.events.lock().expect("events lock").push(event.clone());
            Ok(())
        }
    }

    fn page(url: &str, html: &str) -> FetchedPage {
        FetchedPage {
            url: url.to_string(),
            html: html.to_string(),
            depth: 0,
        }
    }

    struct Harness {
        service: CrawlService,
        indexer: Arc<MemoryIndexer>,
        events: Arc<StdMutex<Vec<JobEvent>>>,
    }

    async fn harness(pages: Vec<FetchedPage>, page_delay: Duration) -> Harness {
        let yaml = r#"
- name: a
  url: https://a.test/
  rate_limit: 0s
  index_names:
    article: articles
    page: pages
  article_selectors:
    title: h1
    body: article
"#;
        let sources = Arc::new(SourceRegistry::new(parse_sources(yaml).expect("yaml")));
        let bus = Arc::new(EventBus::new());
        let events = Arc::new(StdMutex::new(Vec::new()));
        bus.subscribe(Arc::new(Recorder {
            events: events.clone(),
        }))
        .await
        .expect("subscribe");

        let defaults = CrawlerDefaults {
            max_retries: 1,
            rate_limit: Duration::from_millis(1),
            ..Default::default()
        };
        let indexer = Arc::new(MemoryIndexer::new());
        let registry = Arc::new(ProcessorRegistry::new());
        registry.register(Arc::new(ArticleProcessor::new(
            indexer.clone(),
            sources.clone(),
            defaults.clone(),
            "articles",
        )));
        registry.register(Arc::new(PageProcessor::new(
            indexer.clone(),
            sources.clone(),
            defaults.clone(),
            "pages",
        )));

        let coordinator = Arc::new(JobCoordinator::new(sources.clone(), bus));
        let driver = Arc::new(ScriptedDriver { pages, page_delay });
        let service = CrawlService::new(coordinator, sources, registry, driver, defaults);
        Harness {
            service,
            indexer,
            events,
        }
    }

    #[tokio::test]
    async fn test_happy_article_end_to_end() {
        let html = "<html><head><title>T</title>\
                    <meta property=\"og:url\" content=\"https://a.test/x\"></head>\
                    <body><h1>Hi</h1><article>Body text</article></body></html>";
        let harness = harness(
            vec![page("https://a.test/articles/x", html)],
            Duration::ZERO,
        )
        .await;

        let (job, handle) = harness
            .service
            .start_crawl("a", ContentType::Article)
            .await
            .expect("started");
        handle.await.expect("job task");

        assert_eq!(harness.indexer.call_count(), 1);
        let writes = harness.indexer.documents_in("articles");
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].1["title"], "Hi");
        assert_eq!(writes[0].1["body"], "Body text");

        let final_job = harness.service.coordinator().job(&job.id).await.unwrap();
        assert_eq!(final_job.state(), JobState::Completed);
        assert_eq!(final_job.status.progress, 100);

        let events = harness.events.lock().unwrap().clone();
        assert_eq!(events.first().unwrap().kind, EventKind::JobStarted);
        assert_eq!(events.last().unwrap().kind, EventKind::JobCompleted);
    }

    #[tokio::test]
    async fn test_json_ld_classification_routes_to_article() {
        let html = "<html><head>\
                    <script type=\"application/ld+json\">{\"@type\":\"Article\"}</script>\
                    </head><body><h1>Classified</h1><article>A</article></body></html>";
        // the URL matches no article pattern; JSON-LD must win
        let harness = harness(vec![page("https://a.test/misc/x", html)], Duration::ZERO).await;

        let (_, handle) = harness
            .service
            .start_crawl("a", ContentType::Page)
            .await
            .expect("started");
        handle.await.expect("job task");

        assert_eq!(harness.indexer.documents_in("articles").len(), 1);
        assert!(harness.indexer.documents_in("pages").is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_urls_indexed_once() {
        let html = "<h1>Hi</h1><article>A</article>";
        let harness = harness(
            vec![
                page("https://a.test/articles/x", html),
                page("https://a.test/articles/x", html),
                page("https://a.test/articles/y", html),
            ],
            Duration::ZERO,
        )
        .await;

        let (_, handle) = harness
            .service
            .start_crawl("a", ContentType::Article)
            .await
            .expect("started");
        handle.await.expect("job task");

        assert_eq!(harness.indexer.call_count(), 2);
    }

    #[tokio::test]
    async fn test_unrouted_content_type_is_dropped() {
        let harness = harness(
            vec![
                page("https://a.test/jobs/opening", "<p>hiring</p>"),
                page("https://a.test/articles/x", "<h1>Hi</h1><article>A</article>"),
            ],
            Duration::ZERO,
        )
        .await;

        let (job, handle) = harness
            .service
            .start_crawl("a", ContentType::Article)
            .await
            .expect("started");
        handle.await.expect("job task");

        // the job posting is dropped with a warning, the job completes
        assert_eq!(harness.indexer.call_count(), 1);
        let final_job = harness.service.coordinator().job(&job.id).await.unwrap();
        assert_eq!(final_job.state(), JobState::Completed);
    }

    #[tokio::test]
    async fn test_stop_halts_indexing() {
        let html = "<h1>Hi</h1><article>A</article>";
        let pages: Vec<FetchedPage> = (0..200)
            .map(|i| page(&format!("https://a.test/articles/{}", i), html))
            .collect();
        let harness = harness(pages, Duration::from_millis(5)).await;

        let (job, handle) = harness
            .service
            .start_crawl("a", ContentType::Article)
            .await
            .expect("started");

        // let a few pages through, then stop
        tokio::time::sleep(Duration::from_millis(40)).await;
        let stopped = harness.service.coordinator().stop(&job.id).await.unwrap();
        assert_eq!(stopped.state(), JobState::Stopped);

        let calls_at_stop = harness.indexer.call_count();
        handle.await.expect("job task");
        // one in-flight page may still land, nothing more
        assert!(harness.indexer.call_count() <= calls_at_stop + 1);
        assert!(harness.indexer.call_count() < 200);

        let events = harness.events.lock().unwrap().clone();
        let last = events.last().unwrap();
        assert_eq!(last.kind, EventKind::JobCompleted);
        assert_eq!(last.job.state(), JobState::Stopped);
    }

    #[tokio::test]
    async fn test_indexer_failure_threshold_fails_job() {
        let html = "<h1>Hi</h1><article>A</article>";
        let pages: Vec<FetchedPage> = (0..30)
            .map(|i| page(&format!("https://a.test/articles/{}", i), html))
            .collect();
        let harness = harness(pages, Duration::ZERO).await;
        harness.indexer.fail_next(11);

        let (job, handle) = harness
            .service
            .start_crawl("a", ContentType::Article)
            .await
            .expect("started");
        handle.await.expect("job task");

        let final_job = harness.service.coordinator().job(&job.id).await.unwrap();
        assert_eq!(final_job.state(), JobState::Failed);
        assert!(final_job
            .status
            .error_message
            .as_deref()
            .unwrap_or_default()
            .contains("indexing failure rate"));
    }

    #[tokio::test]
    async fn test_indexer_failures_below_threshold_continue() {
        let html = "<h1>Hi</h1><article>A</article>";
        let pages: Vec<FetchedPage> = (0..30)
            .map(|i| page(&format!("https://a.test/articles/{}", i), html))
            .collect();
        let harness = harness(pages, Duration::ZERO).await;
        harness.indexer.fail_next(10);

        let (job, handle) = harness
            .service
            .start_crawl("a", ContentType::Article)
            .await
            .expect("started");
        handle.await.expect("job task");

        let final_job = harness.service.coordinator().job(&job.id).await.unwrap();
        assert_eq!(final_job.state(), JobState::Completed);
        // the ten failed URLs were skipped, the rest indexed
        assert_eq!(harness.indexer.documents_in("articles").len(), 20);
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_in_events() {
        let html = "<h1>Hi</h1><article>A</article>";
        let pages: Vec<FetchedPage> = (0..10)
            .map(|i| page(&format!("https://a.test/articles/{}", i), html))
            .collect();
        let harness = harness(pages, Duration::ZERO).await;

        let (_, handle) = harness
            .service
            .start_crawl("a", ContentType::Article)
            .await
            .expect("started");
        handle.await.expect("job task");

        let events = harness.events.lock().unwrap().clone();
        let progresses: Vec<u8> = events
            .iter()
            .filter(|e| e.kind == EventKind::JobProgress)
            .map(|e| e.progress.unwrap_or(0))
            .collect();
        for pair in progresses.windows(2) {
            assert!(pair[0] < pair[1], "progress regressed: {:?}", progresses);
        }
    }
}
