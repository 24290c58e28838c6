//! Built-in event handlers.

use async_trait::async_trait;
use tracing::{info, warn};
use trawler_types::{CrawlError, EventKind, JobEvent};

use crate::bus::EventHandler;

/// Logs every event at a level implied by its kind.
pub struct LoggingEventHandler {
    name: String,
}

impl LoggingEventHandler {
    pub fn new() -> Self {
        Self {
            name: "logging_handler".to_string(),
        }
    }
}

impl Default for LoggingEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventHandler for LoggingEventHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: &JobEvent) -> Result<(), CrawlError> {
        match event.kind {
            EventKind::JobFailed => {
                warn!(
                    job_id = %event.job.id,
                    source = %event.job.source_name,
                    error = event.error.as_deref().unwrap_or("unknown"),
                    "Job failed"
                );
            }
            EventKind::JobProgress => {
                info!(
                    job_id = %event.job.id,
                    progress = event.progress.unwrap_or(0),
                    "Job progress"
                );
            }
            _ => {
                info!(
                    job_id = %event.job.id,
                    source = %event.job.source_name,
                    event = %event.kind,
                    state = %event.job.state(),
                    "Job event"
                );
            }
        }
        Ok(())
    }
}
