//! JSON-LD structured-data scanning.

use scraper::{Html, Selector};
use serde_json::Value;

/// Read the `@type` of the first JSON-LD block that declares one.
///
/// Blocks that fail to parse as JSON are skipped. `@graph` arrays are
/// scanned in order; an array-valued `@type` contributes its first
/// element.
pub fn extract_json_ld_type(document: &Html) -> Option<String> {
    let selector = Selector::parse("script[type=\"application/ld+json\"]").ok()?;

    for element in document.select(&selector) {
        let json_text: String = element.text().collect();
        let Ok(value) = serde_json::from_str::<Value>(&json_text) else {
            continue;
        };
        if let Some(found) = type_of(&value) {
            return Some(found);
        }
    }
    None
}

fn type_of(value: &Value) -> Option<String> {
    if let Some(graph) = value.get("@graph").and_then(Value::as_array) {
        for item in graph {
            if let Some(found) = type_of(item) {
                return Some(found);
            }
        }
    }
    if let Some(items) = value.as_array() {
        for item in items {
            if let Some(found) = type_of(item) {
                return Some(found);
            }
        }
    }

    match value.get("@type") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(String::from),
        _ => None,
    }
}
