//! Event streaming output.

use async_trait::async_trait;
use trawler_events::EventHandler;
use trawler_types::{CrawlError, JobEvent};

/// Writes every job event to stdout as one JSON line.
pub struct JsonLinesHandler {
    name: String,
}

impl JsonLinesHandler {
    pub fn new() -> Self {
        Self {
            name: "json_lines".to_string(),
        }
    }
}

impl Default for JsonLinesHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventHandler for JsonLinesHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: &JobEvent) -> Result<(), CrawlError> {
        let line = serde_json::to_string(event)
            .map_err(|e| CrawlError::validation(format!("event not serializable: {}", e)))?;
        println!("{}", line);
        Ok(())
    }
}
