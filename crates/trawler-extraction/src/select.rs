//! Selector resolution primitives.
//!
//! A configured selector may be a comma-separated list; elements are tried
//! in order and the first that yields a value wins. A selector that fails
//! to parse is treated as no-match, never as an error.

use scraper::{ElementRef, Html, Selector};

/// Split a selector value into its ordered sub-selectors.
pub fn split_selector(selector: &str) -> Vec<&str> {
    selector
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Text of an element's direct text-node children only.
fn child_text(element: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
        }
    }
    parts.join(" ")
}

/// Accumulated text of a whole subtree, whitespace-normalized.
pub fn full_text(element: ElementRef<'_>) -> String {
    let parts: Vec<&str> = element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    parts.join(" ")
}

/// Resolve a selector to text.
///
/// For each sub-selector in order: the first match's direct child text is
/// the fast path; when that is empty, the match's full subtree text is
/// used. Empty string on no match.
pub fn extract_text(document: &Html, selector: &str) -> String {
    for sub in split_selector(selector) {
        let Ok(parsed) = Selector::parse(sub) else {
            continue;
        };
        if let Some(element) = document.select(&parsed).next() {
            let fast = child_text(element);
            if !fast.is_empty() {
                return fast;
            }
            let full = full_text(element);
            if !full.is_empty() {
                return full;
            }
        }
    }
    String::new()
}

/// Resolve a selector to the text of every element the first productive
/// sub-selector matches.
pub fn extract_text_all(document: &Html, selector: &str) -> Vec<String> {
    for sub in split_selector(selector) {
        let Ok(parsed) = Selector::parse(sub) else {
            continue;
        };
        let texts: Vec<String> = document
            .select(&parsed)
            .map(full_text)
            .filter(|t| !t.is_empty())
            .collect();
        if !texts.is_empty() {
            return texts;
        }
    }
    Vec::new()
}

/// Resolve a selector to an attribute value.
///
/// The first sub-selector whose matched node carries the attribute wins.
pub fn extract_attr(document: &Html, selector: &str, attr: &str) -> String {
    for sub in split_selector(selector) {
        let Ok(parsed) = Selector::parse(sub) else {
            continue;
        };
        for element in document.select(&parsed) {
            if let Some(value) = element.value().attr(attr) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
            }
        }
    }
    String::new()
}

/// Read `<meta property=… content=…>`.
pub fn extract_meta(document: &Html, property: &str) -> String {
    let raw = format!("meta[property=\"{}\"]", property);
    extract_attr(document, &raw, "content")
}

/// Read `<meta name=… content=…>`.
pub fn extract_meta_name(document: &Html, name: &str) -> String {
    let raw = format!("meta[name=\"{}\"]", name);
    extract_attr(document, &raw, "content")
}

/// Detach every subtree matching any exclude selector.
pub fn apply_excludes(document: &mut Html, excludes: &[String]) {
    let mut doomed = Vec::new();
    for exclude in excludes {
        for sub in split_selector(exclude) {
            let Ok(parsed) = Selector::parse(sub) else {
                continue;
            };
            doomed.extend(document.select(&parsed).map(|el| el.id()));
        }
    }
    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Comma-split, trim, and drop empties; used for keyword-style values.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
