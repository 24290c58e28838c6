//! Document metadata extraction and merging.

use scraper::{Html, Selector};
use std::collections::{BTreeMap, HashMap};

use crate::select::{extract_attr, full_text, split_selector};

/// Build the flat metadata map for a document.
///
/// Merge order:
/// 1. per-source metadata selectors (the `content` attribute of the match
///    when present, its text otherwise);
/// 2. every `og:*` and `article:*` meta property under its full property
///    name — these always overwrite;
/// 3. every `twitter:*` meta name with the prefix stripped, added only
///    when the key is still absent.
pub fn extract_metadata(
    document: &Html,
    metadata_selectors: &BTreeMap<String, String>,
) -> HashMap<String, String> {
    let mut metadata = HashMap::new();

    for (key, selector) in metadata_selectors {
        let value = select_content_or_text(document, selector);
        if !value.is_empty() {
            metadata.insert(key.clone(), value);
        }
    }

    if let Ok(selector) = Selector::parse("meta[property]") {
        for element in document.select(&selector) {
            let Some(property) = element.value().attr("property") else {
                continue;
            };
            if !property.starts_with("og:") && !property.starts_with("article:") {
                continue;
            }
            if let Some(content) = element.value().attr("content") {
                let trimmed = content.trim();
                if !trimmed.is_empty() {
                    metadata.insert(property.to_string(), trimmed.to_string());
                }
            }
        }
    }

    if let Ok(selector) = Selector::parse("meta[name]") {
        for element in document.select(&selector) {
            let Some(name) = element.value().attr("name") else {
                continue;
            };
            let Some(stripped) = name.strip_prefix("twitter:") else {
                continue;
            };
            if metadata.contains_key(stripped) {
                continue;
            }
            if let Some(content) = element.value().attr("content") {
                let trimmed = content.trim();
                if !trimmed.is_empty() {
                    metadata.insert(stripped.to_string(), trimmed.to_string());
                }
            }
        }
    }

    metadata
}

/// The match's `content` attribute when present, its text otherwise.
fn select_content_or_text(document: &Html, selector: &str) -> String {
    let content = extract_attr(document, selector, "content");
    if !content.is_empty() {
        return content;
    }
    for sub in split_selector(selector) {
        let Ok(parsed) = Selector::parse(sub) else {
            continue;
        };
        if let Some(element) = document.select(&parsed).next() {
            let text = full_text(element);
            if !text.is_empty() {
                return text;
            }
        }
    }
    String::new()
}
