//! Content classification of fetched pages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic class of a fetched page, used to route processing.
///
/// Variants are declared in label-alphabetical order so that ordered
/// collections keyed by `ContentType` iterate deterministically by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Article,
    Html,
    Image,
    Job,
    Page,
    Video,
}

impl ContentType {
    /// Canonical lowercase label for this content type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Html => "html",
            ContentType::Image => "image",
            ContentType::Job => "job",
            ContentType::Page => "page",
            ContentType::Video => "video",
        }
    }

    /// Parse a label (case-insensitive). Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "article" => Some(ContentType::Article),
            "page" => Some(ContentType::Page),
            "video" => Some(ContentType::Video),
            "image" => Some(ContentType::Image),
            "html" => Some(ContentType::Html),
            "job" => Some(ContentType::Job),
            _ => None,
        }
    }

    /// All known content types, in label-alphabetical order.
    pub fn all() -> [ContentType; 6] {
        [
            ContentType::Article,
            ContentType::Html,
            ContentType::Image,
            ContentType::Job,
            ContentType::Page,
            ContentType::Video,
        ]
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
