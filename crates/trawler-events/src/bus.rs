//! Event bus implementation.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use trawler_types::{CrawlError, JobEvent};

/// A subscriber to job events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Unique handler name, used for unsubscription.
    fn name(&self) -> &str;

    /// Handle one event.
    async fn handle(&self, event: &JobEvent) -> Result<(), CrawlError>;
}

/// Configuration for the event bus.
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Bound on a single handler invocation.
    pub handler_timeout: Duration,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            handler_timeout: Duration::from_secs(30),
        }
    }
}

/// Single-process pub/sub for job events.
///
/// Subscribe and unsubscribe may race publish: publication iterates a
/// snapshot of the handler list taken under a read lock, so a concurrent
/// registry change affects only later publishes.
pub struct EventBus {
    config: EventBusConfig,
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    pub fn with_config(config: EventBusConfig) -> Self {
        Self {
            config,
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Register a handler at the end of the delivery order.
    ///
    /// Handler names are unique; re-subscribing a name is rejected.
    pub async fn subscribe(&self, handler: Arc<dyn EventHandler>) -> Result<(), CrawlError> {
        let mut handlers = self.handlers.write().await;
        if handlers.iter().any(|h| h.name() == handler.name()) {
            return Err(CrawlError::validation(format!(
                "handler '{}' is already subscribed",
                handler.name()
            )));
        }
        debug!(handler = %handler.name(), "Subscribed event handler");
        handlers.push(handler);
        Ok(())
    }

    /// Remove a handler by name.
    pub async fn unsubscribe(&self, name: &str) -> Result<(), CrawlError> {
        let mut handlers = self.handlers.write().await;
        let before = handlers.len();
        handlers.retain(|h| h.name() != name);
        if handlers.len() == before {
            return Err(CrawlError::validation(format!(
                "handler '{}' is not subscribed",
                name
            )));
        }
        debug!(handler = %name, "Unsubscribed event handler");
        Ok(())
    }

    /// Deliver an event to every subscribed handler, in subscription
    /// order.
    ///
    /// Returns when every handler has finished or timed out. A handler
    /// that exceeds the timeout is abandoned: its task keeps running but
    /// its result is ignored. The first handler error is returned after
    /// all handlers have seen the event.
    pub async fn publish(&self, event: &JobEvent) -> Result<(), CrawlError> {
        let snapshot: Vec<Arc<dyn EventHandler>> = {
            let handlers = self.handlers.read().await;
            handlers.clone()
        };

        let mut first_error: Option<CrawlError> = None;
        for handler in snapshot {
            let name = handler.name().to_string();
            let task = tokio::spawn({
                let handler = handler.clone();
                let event = event.clone();
                async move { handler.handle(&event).await }
            });

            match tokio::time::timeout(self.config.handler_timeout, task).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(err))) => {
                    warn!(handler = %name, error = %err, "Event handler failed");
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
                Ok(Err(join_err)) => {
                    warn!(handler = %name, error = %join_err, "Event handler panicked");
                    if first_error.is_none() {
                        first_error = Some(CrawlError::validation(format!(
                            "handler '{}' panicked: {}",
                            name, join_err
                        )));
                    }
                }
                Err(_) => {
                    // the task keeps running; only its outcome is dropped
                    warn!(handler = %name, "Event handler timed out, abandoning");
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Current bus statistics.
    pub async fn stats(&self) -> EventBusStats {
        EventBusStats {
            handler_count: self.handlers.read().await.len(),
            handler_timeout: self.config.handler_timeout,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time bus statistics.
#[derive(Debug, Clone)]
pub struct EventBusStats {
    pub handler_count: usize,
    pub handler_timeout: Duration,
}
