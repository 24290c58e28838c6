//! Per-source CSS selector sets.
//!
//! Every selector value may be a comma-separated list of expressions tried
//! in order. An empty selector means "not configured" and sends the
//! extractor straight to its fallback chain.

use serde::{Deserialize, Serialize};

/// Selectors used by the article extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleSelectors {
    /// Optional container subtree for body extraction. When set, the body
    /// is the container's accumulated text after excludes are removed.
    pub container: String,
    pub title: String,
    pub body: String,
    pub intro: String,
    pub author: String,
    pub byline: String,
    pub byline_name: String,
    pub published_time: String,
    pub section: String,
    pub category: String,
    pub keywords: String,
    pub tags: String,
    pub canonical: String,
    /// Selector for the element carrying the article ID attribute.
    pub article_id: String,
    /// Subtrees removed before container-scoped body extraction.
    pub exclude: Vec<String>,
}

impl Default for ArticleSelectors {
    fn default() -> Self {
        Self {
            container: String::new(),
            title: "h1, .article-title, .headline".to_string(),
            body: "article, .article-body, .article-content".to_string(),
            intro: ".intro, .lead, .article-intro".to_string(),
            author: ".author, [rel=author], .author-name".to_string(),
            byline: ".byline".to_string(),
            byline_name: ".byline-name, .byline .name".to_string(),
            published_time: "time[datetime], .published-date, time".to_string(),
            section: ".section, [data-section]".to_string(),
            category: ".category".to_string(),
            keywords: ".keywords".to_string(),
            tags: ".tags a, .tag".to_string(),
            canonical: "link[rel=canonical]".to_string(),
            article_id: "[data-article-id], [data-post-id], article[id]".to_string(),
            exclude: vec![
                "script".to_string(),
                "style".to_string(),
                ".advertisement".to_string(),
            ],
        }
    }
}

/// Selectors used by the page extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSelectors {
    pub title: String,
    pub content: String,
    pub description: String,
    pub keywords: String,
    pub canonical: String,
    pub og_title: String,
    pub og_description: String,
    pub og_image: String,
    pub og_url: String,
    pub og_type: String,
    pub og_site_name: String,
    /// Subtrees stripped from the document before any extraction.
    pub exclude: Vec<String>,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            title: "h1, .page-title".to_string(),
            content: "main, article, .content".to_string(),
            description: ".description, .summary".to_string(),
            keywords: ".keywords".to_string(),
            canonical: "link[rel=canonical]".to_string(),
            og_title: String::new(),
            og_description: String::new(),
            og_image: String::new(),
            og_url: String::new(),
            og_type: String::new(),
            og_site_name: String::new(),
            exclude: vec![
                "script".to_string(),
                "style".to_string(),
                "nav".to_string(),
                "header".to_string(),
                "footer".to_string(),
            ],
        }
    }
}
