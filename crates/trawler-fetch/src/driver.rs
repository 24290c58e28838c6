//! Depth-bounded crawl driver.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use scraper::{Html, Selector};
use std::collections::HashSet;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use trawler_config::{CrawlerDefaults, Source};
use trawler_types::CrawlError;
use url::Url;

use crate::client::{FetchClient, RetryConfig};
use crate::limiter::RateLimiter;

/// One fetched document, handed to the processing pipeline.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub html: String,
    pub depth: u32,
}

/// Emits fetched documents for a source until exhaustion or cancellation.
#[async_trait]
pub trait FetchDriver: Send + Sync {
    /// Crawl `source`, sending each fetched page into `pages`.
    ///
    /// Implementations must honour the source's rate limit, depth, and
    /// domain constraints, and must abort at the next suspension point
    /// once `token` fires.
    async fn crawl(
        &self,
        source: &Source,
        token: &CancellationToken,
        pages: mpsc::Sender<FetchedPage>,
    ) -> Result<(), CrawlError>;
}

/// Breadth-first HTTP driver.
///
/// Visits each URL at most once, `Source.parallelism` fetches in flight,
/// one rate-limit permit per request. Permanent fetch failures skip the
/// URL; transient failures that outlive the retry budget abort the crawl.
pub struct HttpFetchDriver {
    defaults: CrawlerDefaults,
}

impl HttpFetchDriver {
    pub fn new(defaults: CrawlerDefaults) -> Self {
        Self { defaults }
    }

    fn effective_depth(&self, source: &Source) -> u32 {
        if source.max_depth > 0 {
            source.max_depth
        } else {
            self.defaults.max_depth
        }
    }
}

#[async_trait]
impl FetchDriver for HttpFetchDriver {
    async fn crawl(
        &self,
        source: &Source,
        token: &CancellationToken,
        pages: mpsc::Sender<FetchedPage>,
    ) -> Result<(), CrawlError> {
        let client = FetchClient::new(
            RetryConfig::with_rate_limit(self.defaults.max_retries, source.rate_limit),
            self.defaults.operation_timeout,
        )?;
        let limiter = RateLimiter::new(source.rate_limit, source.random_delay_factor);
        let max_depth = self.effective_depth(source);
        let parallelism = source.parallelism.max(1);

        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier = Vec::new();
        for url in std::iter::once(&source.url).chain(source.seed_urls.iter()) {
            if visited.insert(url.clone()) {
                frontier.push(url.clone());
            }
        }

        for depth in 0..=max_depth {
            if frontier.is_empty() {
                break;
            }
            if token.is_cancelled() {
                return Err(CrawlError::Cancelled);
            }
            debug!(
                source = %source.name,
                depth = depth,
                frontier = frontier.len(),
                "Crawling depth level"
            );

            let discover = depth < max_depth;
            let results: Vec<Result<Vec<String>, CrawlError>> = stream::iter(
                frontier.drain(..).map(|url| {
                    fetch_one(&client, &limiter, token, &pages, source, url, depth, discover)
                }),
            )
            .buffer_unordered(parallelism)
            .collect()
            .await;

            let mut next = Vec::new();
            for result in results {
                for link in result? {
                    if visited.insert(link.clone()) {
                        next.push(link);
                    }
                }
            }
            frontier = next;
        }

        info!(source = %source.name, visited = visited.len(), "Crawl finished");
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
async fn fetch_one(
    client: &FetchClient,
    limiter: &RateLimiter,
    token: &CancellationToken,
    pages: &mpsc::Sender<FetchedPage>,
    source: &Source,
    url: String,
    depth: u32,
    discover: bool,
) -> Result<Vec<String>, CrawlError> {
    if !source.is_url_allowed(&url) {
        debug!(url = %url, "URL disallowed by source rules");
        return Ok(Vec::new());
    }

    tokio::select! {
        _ = limiter.acquire() => {}
        _ = token.cancelled() => return Err(CrawlError::Cancelled),
    }

    let html = match client.fetch_text(&url, token).await {
        Ok(html) => html,
        Err(err @ CrawlError::PermanentFetch { .. }) => {
            warn!(url = %url, error = %err, "Skipping URL after permanent fetch failure");
            return Ok(Vec::new());
        }
        Err(err) => return Err(err),
    };

    let links = if discover {
        discover_links(&html, &url)
            .into_iter()
            .filter(|link| link_in_scope(source, link))
            .collect()
    } else {
        Vec::new()
    };

    let page = FetchedPage { url, html, depth };
    tokio::select! {
        sent = pages.send(page) => {
            if sent.is_err() {
                // receiver gone, the pipeline is shutting down
                return Err(CrawlError::Cancelled);
            }
        }
        _ = token.cancelled() => return Err(CrawlError::Cancelled),
    }

    Ok(links)
}

/// Absolute same-scheme links found in a document.
pub fn discover_links(html: &str, base_url: &str) -> Vec<String> {
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut links = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(mut resolved) = base.join(href.trim()) else {
            continue;
        };
        resolved.set_fragment(None);
        if matches!(resolved.scheme(), "http" | "https") {
            links.push(resolved.to_string());
        }
    }
    links
}

fn link_in_scope(source: &Source, link: &str) -> bool {
    let Ok(parsed) = Url::parse(link) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    source.matches_host(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_source(name: &str, url: &str, max_depth: u32) -> Source {
        let yaml = format!(
            "- name: {}\n  url: {}\n  max_depth: {}\n  rate_limit: 0s\n  parallelism: 2\n",
            name, url, max_depth
        );
        trawler_config::parse_sources(&yaml)
            .expect("source yaml")
            .remove(0)
    }

    async fn collect_pages(mut rx: mpsc::Receiver<FetchedPage>) -> Vec<FetchedPage> {
        let mut pages = Vec::new();
        while let Some(page) = rx.recv().await {
            pages.push(page);
        }
        pages
    }

    #[tokio::test]
    async fn test_crawl_follows_links_within_depth() {
        let server = MockServer::start().await;
        let root =
            "<a href=\"/one\">1</a><a href=\"/two\">2</a><a href=\"/one#frag\">dup</a>";
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(root))
            .mount(&server)
            .await;
        for leaf in ["/one", "/two"] {
            Mock::given(method("GET"))
                .and(path(leaf))
                .respond_with(ResponseTemplate::new(200).set_body_string("<p>leaf</p>"))
                .mount(&server)
                .await;
        }

        let source = test_source("t", &format!("{}/", server.uri()), 1);
        let driver = HttpFetchDriver::new(CrawlerDefaults::default());
        let (tx, rx) = mpsc::channel(16);
        let token = CancellationToken::new();

        let crawl = driver.crawl(&source, &token, tx);
        let (result, pages) = tokio::join!(crawl, collect_pages(rx));
        result.expect("crawl");

        assert_eq!(pages.len(), 3);
        assert_eq!(pages.iter().filter(|p| p.depth == 1).count(), 2);
    }

    #[tokio::test]
    async fn test_depth_zero_fetches_only_root() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<a href=\"/one\">1</a>"),
            )
            .mount(&server)
            .await;

        let mut source = test_source("t", &format!("{}/", server.uri()), 1);
        source.max_depth = 0;
        let mut defaults = CrawlerDefaults::default();
        defaults.max_depth = 0;

        let driver = HttpFetchDriver::new(defaults);
        let (tx, rx) = mpsc::channel(16);
        let cancel_token = CancellationToken::new();
        let crawl = driver.crawl(&source, &cancel_token, tx);
        let (result, pages) = tokio::join!(crawl, collect_pages(rx));
        result.expect("crawl");
        assert_eq!(pages.len(), 1);
    }

    #[tokio::test]
    async fn test_disallow_rules_skip_urls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<a href=\"/private/x\">p</a><a href=\"/open\">o</a>"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/open"))
            .respond_with(ResponseTemplate::new(200).set_body_string("open"))
            .mount(&server)
            .await;

        let mut source = test_source("t", &format!("{}/", server.uri()), 1);
        source.rules = vec![trawler_config::SourceRule {
            pattern: "/private/".to_string(),
            action: trawler_config::RuleAction::Disallow,
        }];

        let driver = HttpFetchDriver::new(CrawlerDefaults::default());
        let (tx, rx) = mpsc::channel(16);
        let cancel_token = CancellationToken::new();
        let crawl = driver.crawl(&source, &cancel_token, tx);
        let (result, pages) = tokio::join!(crawl, collect_pages(rx));
        result.expect("crawl");

        let urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
        assert!(urls.iter().all(|u| !u.contains("/private/")));
        assert_eq!(pages.len(), 2);
    }

    #[tokio::test]
    async fn test_permanent_failures_do_not_abort_crawl() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<a href=\"/gone\">g</a><a href=\"/ok\">o</a>"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let source = test_source("t", &format!("{}/", server.uri()), 1);
        let driver = HttpFetchDriver::new(CrawlerDefaults::default());
        let (tx, rx) = mpsc::channel(16);
        let cancel_token = CancellationToken::new();
        let crawl = driver.crawl(&source, &cancel_token, tx);
        let (result, pages) = tokio::join!(crawl, collect_pages(rx));
        result.expect("crawl survives 404s");
        assert_eq!(pages.len(), 2);
    }

    #[tokio::test]
    async fn test_cancellation_aborts_crawl() {
        let source = test_source("t", "https://unreachable.test/", 1);
        let driver = HttpFetchDriver::new(CrawlerDefaults::default());
        let (tx, _rx) = mpsc::channel(16);
        let token = CancellationToken::new();
        token.cancel();

        let err = driver
            .crawl(&source, &token, tx)
            .await
            .expect_err("cancelled");
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_discover_links_resolves_and_filters() {
        let html = "<a href=\"/rel\">r</a>\
                    <a href=\"https://other.test/abs\">a</a>\
                    <a href=\"mailto:x@y.test\">m</a>\
                    <a href=\"/frag#sec\">f</a>";
        let links = discover_links(html, "https://a.test/dir/");
        assert_eq!(
            links,
            vec![
                "https://a.test/rel",
                "https://other.test/abs",
                "https://a.test/frag",
            ]
        );
    }

    #[test]
    fn test_discover_links_bad_base_is_empty() {
        assert!(discover_links("<a href=\"/x\">x</a>", "not a url").is_empty());
    }

    #[tokio::test]
    async fn test_rate_limited_crawl_spaces_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<a href=\"/a\">a</a><a href=\"/b\">b</a>"),
            )
            .mount(&server)
            .await;
        for leaf in ["/a", "/b"] {
            Mock::given(method("GET"))
                .and(path(leaf))
                .respond_with(ResponseTemplate::new(200).set_body_string("leaf"))
                .mount(&server)
                .await;
        }

        let mut source = test_source("t", &format!("{}/", server.uri()), 1);
        source.rate_limit = Duration::from_millis(20);
        source.random_delay_factor = 0.0;

        let driver = HttpFetchDriver::new(CrawlerDefaults::default());
        let (tx, rx) = mpsc::channel(16);
        let started = tokio::time::Instant::now();
        let cancel_token = CancellationToken::new();
        let crawl = driver.crawl(&source, &cancel_token, tx);
        let (result, pages) = tokio::join!(crawl, collect_pages(rx));
        result.expect("crawl");

        assert_eq!(pages.len(), 3);
        // three permits at 20ms spacing keep the whole crawl above 40ms
        assert!(started.elapsed() >= Duration::from_millis(40));
    }
}
