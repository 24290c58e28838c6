//! Text normalization utilities.

use scraper::{Html, Selector};
use std::collections::HashMap;
use tracing::debug;

/// Normalize an HTML snippet to plain text.
///
/// Walks `<p>` and `<div>` descendants in document order, collecting each
/// element's trimmed text when non-empty, joined with single spaces.
pub fn process(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("p, div") else {
        return String::new();
    };

    let mut parts = Vec::new();
    for element in document.select(&selector) {
        let text: Vec<&str> = element
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        let joined = text.join(" ");
        if !joined.is_empty() {
            parts.push(joined);
        }
    }
    parts.join(" ")
}

/// Map [`process`] over a batch, preserving order.
pub fn process_batch(batch: &[String]) -> Vec<String> {
    batch.iter().map(|html| process(html)).collect()
}

/// [`process`] with metadata attached for logging.
pub fn process_with_metadata(html: &str, metadata: &HashMap<String, String>) -> String {
    debug!(keys = metadata.len(), "Processing content with metadata");
    process(html)
}
