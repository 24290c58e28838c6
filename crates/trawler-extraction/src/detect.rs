//! Content-type classification.

use scraper::Html;
use std::collections::BTreeMap;
use std::collections::HashMap;
use tracing::debug;
use trawler_types::ContentType;

use crate::jsonld::extract_json_ld_type;

/// Classify a page.
///
/// Precedence, first hit wins: the JSON-LD `@type`, the extracted
/// metadata's `type` key, then URL-substring patterns. The pattern table
/// is keyed by `ContentType`, whose ordering is its label order, so
/// classification is reproducible. Everything else is a `page`.
pub fn detect_content_type(
    url: &str,
    metadata: &HashMap<String, String>,
    json_ld_type: Option<&str>,
    patterns: &BTreeMap<ContentType, Vec<String>>,
) -> ContentType {
    if let Some(raw) = json_ld_type {
        if let Some(found) = ContentType::from_label(raw) {
            debug!(url = %url, content_type = %found, "Classified via JSON-LD @type");
            return found;
        }
    }

    if let Some(raw) = metadata.get("type") {
        if let Some(found) = ContentType::from_label(raw) {
            debug!(url = %url, content_type = %found, "Classified via metadata type hint");
            return found;
        }
    }

    let lowered = url.to_lowercase();
    for (content_type, substrings) in patterns {
        for pattern in substrings {
            if lowered.contains(&pattern.to_lowercase()) {
                debug!(url = %url, content_type = %content_type, pattern = %pattern, "Classified via URL pattern");
                return *content_type;
            }
        }
    }

    ContentType::Page
}

/// Classify a parsed document, reading the JSON-LD `@type` from it first.
pub fn detect_document(
    document: &Html,
    url: &str,
    metadata: &HashMap<String, String>,
    patterns: &BTreeMap<ContentType, Vec<String>>,
) -> ContentType {
    let json_ld_type = extract_json_ld_type(document);
    detect_content_type(url, metadata, json_ld_type.as_deref(), patterns)
}
