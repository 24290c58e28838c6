//! HTTP client with retry and backoff.

use rand::Rng;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use trawler_types::CrawlError;

/// Retry configuration with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Backoff multiplier applied per retry.
    pub backoff_multiplier: f64,
    /// Cap on the delay between retries.
    pub max_delay: Duration,
    /// Add jitter to avoid thundering herds.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Retry pacing derived from a source's rate limit.
    pub fn with_rate_limit(max_attempts: u32, rate_limit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: rate_limit.max(Duration::from_millis(100)),
            ..Default::default()
        }
    }
}

/// HTTP fetcher wrapping `reqwest` with retry, backoff, and
/// cancellation-aware sleeps.
#[derive(Debug)]
pub struct FetchClient {
    client: Client,
    retry: RetryConfig,
}

impl FetchClient {
    pub fn new(retry: RetryConfig, request_timeout: Duration) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .user_agent(concat!("Trawler/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .connect_timeout(Duration::from_secs(3))
            .timeout(request_timeout)
            .build()
            .map_err(|e| CrawlError::configuration(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { client, retry })
    }

    /// Fetch a URL's body with retries.
    ///
    /// 5xx, 408, and 429 responses and transport errors are retried up to
    /// the attempt budget; other 4xx responses fail immediately as
    /// permanent. The token is honoured between attempts and during the
    /// request itself.
    pub async fn fetch_text(
        &self,
        url: &str,
        token: &CancellationToken,
    ) -> Result<String, CrawlError> {
        let mut last_error = CrawlError::transient_fetch(format!("no attempts made for {}", url));

        for attempt in 0..self.retry.max_attempts {
            if token.is_cancelled() {
                return Err(CrawlError::Cancelled);
            }

            let outcome = tokio::select! {
                response = self.client.get(url).send() => self.read_response(url, response).await,
                _ = token.cancelled() => Err(CrawlError::Cancelled),
            };

            match outcome {
                Ok(body) => {
                    if attempt > 0 {
                        debug!(url = %url, attempt = attempt + 1, "Fetch succeeded after retry");
                    }
                    return Ok(body);
                }
                Err(err) if err.is_cancelled() => return Err(err),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    warn!(url = %url, attempt = attempt + 1, error = %err, "Fetch attempt failed");
                    last_error = err;
                }
            }

            if attempt + 1 < self.retry.max_attempts {
                let delay = self.backoff_delay(attempt);
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = token.cancelled() => return Err(CrawlError::Cancelled),
                }
            }
        }

        Err(last_error)
    }

    async fn read_response(
        &self,
        url: &str,
        response: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<String, CrawlError> {
        let response = response.map_err(|e| {
            if e.is_timeout() {
                CrawlError::timeout(format!("fetch {}", url))
            } else {
                CrawlError::transient_fetch(format!("request to {} failed: {}", url, e))
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return response.text().await.map_err(|e| {
                CrawlError::transient_fetch(format!("reading body of {} failed: {}", url, e))
            });
        }

        if is_retryable_status(status) {
            Err(CrawlError::transient_fetch(format!(
                "{} returned {}",
                url, status
            )))
        } else {
            Err(CrawlError::permanent_fetch(
                format!("{} returned {}", url, status),
                Some(status.as_u16()),
            ))
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.retry.initial_delay.as_millis() as f64
            * self.retry.backoff_multiplier.powi(attempt as i32);
        let capped = Duration::from_millis(base as u64).min(self.retry.max_delay);
        if self.retry.jitter {
            let jitter = capped.as_millis() as f64 * rand::thread_rng().gen_range(0.0..0.1);
            capped + Duration::from_millis(jitter as u64)
        } else {
            capped
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}
