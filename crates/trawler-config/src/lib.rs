//! Source configuration for the Trawler crawler.
//!
//! A source ties a root URL to its selectors, rate limits, allow-lists, and
//! index names. Sources are loaded once at startup (YAML file plus
//! `CRAWLER_`-prefixed environment tunables) and never mutated afterwards;
//! the registry lends them out by immutable reference.

pub mod duration;
pub mod env;
pub mod registry;
pub mod selectors;
pub mod source;

pub use duration::{format_duration, parse_duration};
pub use env::CrawlerDefaults;
pub use registry::SourceRegistry;
pub use selectors::{ArticleSelectors, PageSelectors};
pub use source::{
    default_content_type_patterns, load_sources, parse_sources, RuleAction, Source, SourceRule,
};

use thiserror::Error;

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("cannot parse config file {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("invalid source '{name}': {reason}")]
    InvalidSource { name: String, reason: String },

    #[error("duplicate source name '{name}'")]
    DuplicateSource { name: String },

    #[error("invalid value for {var}: {reason}")]
    InvalidEnv { var: String, reason: String },
}

impl From<ConfigError> for trawler_types::CrawlError {
    fn from(err: ConfigError) -> Self {
        trawler_types::CrawlError::configuration(err.to_string())
    }
}
