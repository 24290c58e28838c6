//! Extracted record types and their indexing normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured article extracted from one URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub intro: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub byline_name: String,
    /// Publication instant; `None` when no date could be parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<DateTime<Utc>>,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub section: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub og_title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub og_description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub og_image: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub og_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub og_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub og_site_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub canonical_url: String,
    #[serde(default)]
    pub word_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Create an empty article anchored to its source URL.
    pub fn new(id: impl Into<String>, source_url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            source_url: source_url.into(),
            created_at: now,
            updated_at: now,
            ..Default::default()
        }
    }

    /// Normalize the record before it is handed to the indexer.
    ///
    /// Trims every string field (whitespace-only becomes empty), fills the
    /// Open Graph title/description from the native fields when the meta
    /// tags were absent, falls the canonical URL back to the source URL,
    /// cleans tag/keyword lists, and recomputes the body word count.
    pub fn prepare_for_indexing(&mut self) {
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.body);
        trim_in_place(&mut self.intro);
        trim_in_place(&mut self.author);
        trim_in_place(&mut self.byline_name);
        trim_in_place(&mut self.description);
        trim_in_place(&mut self.section);
        trim_in_place(&mut self.category);
        trim_in_place(&mut self.og_title);
        trim_in_place(&mut self.og_description);
        trim_in_place(&mut self.og_image);
        trim_in_place(&mut self.og_url);
        trim_in_place(&mut self.og_type);
        trim_in_place(&mut self.og_site_name);
        trim_in_place(&mut self.canonical_url);

        if self.og_title.is_empty() {
            self.og_title = self.title.clone();
        }
        if self.og_description.is_empty() {
            self.og_description = self.description.clone();
        }
        if self.canonical_url.is_empty() {
            self.canonical_url = self.source_url.clone();
        }

        self.tags = clean_string_list(std::mem::take(&mut self.tags));
        self.keywords = clean_string_list(std::mem::take(&mut self.keywords));
        self.word_count = self.body.split_whitespace().count();
        self.updated_at = Utc::now();
    }
}

/// Generic page extracted from one URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub og_title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub og_description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub og_image: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub og_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub og_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub og_site_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub canonical_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Page {
    /// Create an empty page anchored to its URL.
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            url: url.into(),
            created_at: now,
            updated_at: now,
            ..Default::default()
        }
    }

    /// Normalize the record before it is handed to the indexer.
    pub fn prepare_for_indexing(&mut self) {
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.content);
        trim_in_place(&mut self.description);
        trim_in_place(&mut self.og_title);
        trim_in_place(&mut self.og_description);
        trim_in_place(&mut self.og_image);
        trim_in_place(&mut self.og_url);
        trim_in_place(&mut self.og_type);
        trim_in_place(&mut self.og_site_name);
        trim_in_place(&mut self.canonical_url);

        if self.og_title.is_empty() {
            self.og_title = self.title.clone();
        }
        if self.og_description.is_empty() {
            self.og_description = self.description.clone();
        }
        if self.canonical_url.is_empty() {
            self.canonical_url = self.url.clone();
        }

        self.keywords = clean_string_list(std::mem::take(&mut self.keywords));
        self.updated_at = Utc::now();
    }
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

/// Trim entries, drop empties, and dedup preserving first-occurrence order.
pub fn clean_string_list(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut cleaned = Vec::with_capacity(values.len());
    for value in values {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            cleaned.push(trimmed.to_string());
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_string_list_dedups_preserving_order() {
        let cleaned = clean_string_list(vec![
            " b ".to_string(),
            "a".to_string(),
            "b".to_string(),
            "".to_string(),
            "  ".to_string(),
            "a".to_string(),
        ]);
        assert_eq!(cleaned, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_article_prepare_fills_fallbacks() {
        let mut article = Article::new("id-1", "https://a.test/x");
        article.title = "  Hello  ".to_string();
        article.description = "Desc".to_string();
        article.body = "one two  three".to_string();
        article.prepare_for_indexing();

        assert_eq!(article.title, "Hello");
        assert_eq!(article.og_title, "Hello");
        assert_eq!(article.og_description, "Desc");
        assert_eq!(article.canonical_url, "https://a.test/x");
        assert_eq!(article.word_count, 3);
    }

    #[test]
    fn test_article_prepare_keeps_existing_og_values() {
        let mut article = Article::new("id-1", "https://a.test/x");
        article.title = "Native".to_string();
        article.og_title = "From og".to_string();
        article.canonical_url = "https://a.test/canonical".to_string();
        article.prepare_for_indexing();

        assert_eq!(article.og_title, "From og");
        assert_eq!(article.canonical_url, "https://a.test/canonical");
    }

    #[test]
    fn test_whitespace_only_fields_become_empty() {
        let mut article = Article::new("id-1", "https://a.test/x");
        article.section = "   ".to_string();
        article.prepare_for_indexing();
        assert!(article.section.is_empty());
    }

    #[test]
    fn test_empty_lists_absent_from_serialization() {
        let mut article = Article::new("id-1", "https://a.test/x");
        article.tags = vec!["  ".to_string(), String::new()];
        article.prepare_for_indexing();

        let json = serde_json::to_value(&article).expect("serialize");
        assert!(json.get("tags").is_none());
        assert!(json.get("keywords").is_none());
        assert!(json.get("published_date").is_none());
    }

    #[test]
    fn test_page_prepare_canonical_falls_back_to_url() {
        let mut page = Page::new("id-2", "https://a.test/about");
        page.title = "About".to_string();
        page.prepare_for_indexing();

        assert_eq!(page.canonical_url, "https://a.test/about");
        assert_eq!(page.og_title, "About");
    }
}
