//! Processor registry.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;
use trawler_types::{ContentType, CrawlError, Item, Job};

use crate::processors::{Processor, ProcessorInput};

/// Maps content types to their processors.
///
/// Registration is idempotent: a later registration for the same content
/// type replaces the earlier one. Lookups may run concurrently with
/// registration.
#[derive(Default)]
pub struct ProcessorRegistry {
    processors: DashMap<ContentType, Arc<dyn Processor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a processor under its content type, replacing any prior
    /// entry.
    pub fn register(&self, processor: Arc<dyn Processor>) {
        let content_type = processor.content_type();
        debug!(content_type = %content_type, "Registered processor");
        self.processors.insert(content_type, processor);
    }

    /// The processor for a content type, if one is registered.
    pub fn get(&self, content_type: ContentType) -> Option<Arc<dyn Processor>> {
        self.processors
            .get(&content_type)
            .map(|entry| entry.value().clone())
    }

    /// Route an input to the processor for `content_type`.
    pub async fn process_content(
        &self,
        job: &Job,
        content_type: ContentType,
        input: ProcessorInput,
    ) -> Result<Item, CrawlError> {
        let processor = self.get(content_type).ok_or_else(|| {
            CrawlError::validation(format!("unsupported content type '{}'", content_type))
        })?;
        processor.process(job, input).await
    }

    /// Start every registered processor.
    pub async fn start_all(&self) -> Result<(), CrawlError> {
        for entry in self.processors.iter() {
            entry.value().start().await?;
        }
        Ok(())
    }

    /// Stop every registered processor.
    pub async fn stop_all(&self) -> Result<(), CrawlError> {
        for entry in self.processors.iter() {
            entry.value().stop().await?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}
