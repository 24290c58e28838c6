//! Source definitions and config-file loading.

use crate::duration;
use crate::selectors::{ArticleSelectors, PageSelectors};
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use trawler_types::ContentType;
use url::Url;

/// What to do with a URL matching a rule pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

/// One allow/disallow rule; `pattern` matches as a URL substring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRule {
    pub pattern: String,
    pub action: RuleAction,
}

fn default_rate_limit() -> Duration {
    Duration::from_secs(2)
}

fn default_random_delay_factor() -> f64 {
    2.0
}

fn default_parallelism() -> usize {
    2
}

/// A named crawl source, immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Unique source name.
    pub name: String,
    /// Root URL the crawl starts from.
    pub url: String,
    /// Additional URLs enqueued alongside the root at depth zero. A
    /// non-empty seed list gives progress reporting a known total.
    #[serde(default)]
    pub seed_urls: Vec<String>,
    /// Host patterns the crawl may visit; exact hosts or `*.host` suffixes.
    #[serde(default)]
    pub allowed_domains: Vec<String>,
    #[serde(default)]
    pub max_depth: u32,
    /// Minimum interval between requests to this source.
    #[serde(default = "default_rate_limit", with = "duration::serde_str")]
    pub rate_limit: Duration,
    /// Random jitter ceiling as a multiple of `rate_limit`.
    #[serde(default = "default_random_delay_factor")]
    pub random_delay_factor: f64,
    /// Concurrent workers for this source.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Index name per content type (e.g. `article: articles`).
    #[serde(default)]
    pub index_names: BTreeMap<ContentType, String>,
    #[serde(default)]
    pub article_selectors: ArticleSelectors,
    #[serde(default)]
    pub page_selectors: PageSelectors,
    /// Ordered allow/disallow rules; first substring match wins.
    #[serde(default)]
    pub rules: Vec<SourceRule>,
    /// URL-substring patterns per content type for classification.
    /// Empty means the built-in default table.
    #[serde(default)]
    pub content_type_patterns: BTreeMap<ContentType, Vec<String>>,
    /// Extra metadata selectors, keyed by output field name.
    #[serde(default)]
    pub metadata_selectors: BTreeMap<String, String>,
}

impl Source {
    /// Validate structural constraints that YAML cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidSource {
                name: self.name.clone(),
                reason: "name must not be empty".to_string(),
            });
        }
        if Url::parse(&self.url).is_err() {
            return Err(ConfigError::InvalidSource {
                name: self.name.clone(),
                reason: format!("root URL '{}' does not parse", self.url),
            });
        }
        if self.parallelism == 0 {
            return Err(ConfigError::InvalidSource {
                name: self.name.clone(),
                reason: "parallelism must be positive".to_string(),
            });
        }
        if self.random_delay_factor < 0.0 {
            return Err(ConfigError::InvalidSource {
                name: self.name.clone(),
                reason: "random_delay_factor must be non-negative".to_string(),
            });
        }
        Ok(())
    }

    /// Whether `host` matches this source's allowed domains or root host.
    pub fn matches_host(&self, host: &str) -> bool {
        for pattern in &self.allowed_domains {
            if let Some(suffix) = pattern.strip_prefix("*.") {
                if host == suffix || host.ends_with(&format!(".{}", suffix)) {
                    return true;
                }
            } else if host == pattern {
                return true;
            }
        }
        Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h == host))
            .unwrap_or(false)
    }

    /// Apply the rule list to a URL. First matching pattern wins; a URL
    /// with no matching rule is allowed.
    pub fn is_url_allowed(&self, url: &str) -> bool {
        for rule in &self.rules {
            if url.contains(&rule.pattern) {
                return rule.action == RuleAction::Allow;
            }
        }
        true
    }

    /// Resolve the index name for a content type.
    pub fn index_for(&self, content_type: ContentType) -> Option<&str> {
        self.index_names.get(&content_type).map(String::as_str)
    }

    /// The classification pattern table: configured patterns when present,
    /// otherwise the built-in defaults.
    pub fn content_type_patterns(&self) -> BTreeMap<ContentType, Vec<String>> {
        if self.content_type_patterns.is_empty() {
            default_content_type_patterns()
        } else {
            self.content_type_patterns.clone()
        }
    }
}

/// Built-in URL-substring patterns for content-type classification.
pub fn default_content_type_patterns() -> BTreeMap<ContentType, Vec<String>> {
    let mut patterns = BTreeMap::new();
    patterns.insert(
        ContentType::Article,
        vec!["/article/", "/articles/", "/post/", "/posts/"]
            .into_iter()
            .map(String::from)
            .collect(),
    );
    patterns.insert(
        ContentType::Page,
        vec!["/page/", "/pages/"].into_iter().map(String::from).collect(),
    );
    patterns.insert(
        ContentType::Video,
        vec!["/video/", "/videos/"].into_iter().map(String::from).collect(),
    );
    patterns.insert(
        ContentType::Image,
        vec!["/image/", "/images/", "/photo/", "/photos/", "/gallery/"]
            .into_iter()
            .map(String::from)
            .collect(),
    );
    patterns.insert(
        ContentType::Job,
        vec!["/job/", "/jobs/", "/career/", "/careers/"]
            .into_iter()
            .map(String::from)
            .collect(),
    );
    patterns
}

/// Load and validate the source list from a YAML file.
///
/// The file's top level is a sequence of source records. Duplicate names
/// are rejected.
pub fn load_sources(path: impl AsRef<Path>) -> Result<Vec<Source>, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let sources = parse_sources(&raw).map_err(|e| match e {
        ConfigError::Parse { reason, .. } => ConfigError::Parse {
            path: path.display().to_string(),
            reason,
        },
        other => other,
    })?;
    debug!(path = %path.display(), count = sources.len(), "Loaded source config");
    Ok(sources)
}

/// Parse a YAML source list from a string.
pub fn parse_sources(raw: &str) -> Result<Vec<Source>, ConfigError> {
    let sources: Vec<Source> = serde_yaml::from_str(raw).map_err(|e| ConfigError::Parse {
        path: "<inline>".to_string(),
        reason: e.to_string(),
    })?;

    let mut seen = std::collections::HashSet::new();
    for source in &sources {
        source.validate()?;
        if !seen.insert(source.name.clone()) {
            return Err(ConfigError::DuplicateSource {
                name: source.name.clone(),
            });
        }
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(name: &str, url: &str) -> Source {
        Source {
            name: name.to_string(),
            url: url.to_string(),
            seed_urls: Vec::new(),
            allowed_domains: Vec::new(),
            max_depth: 2,
            rate_limit: Duration::from_secs(2),
            random_delay_factor: 2.0,
            parallelism: 2,
            index_names: BTreeMap::new(),
            article_selectors: ArticleSelectors::default(),
            page_selectors: PageSelectors::default(),
            rules: Vec::new(),
            content_type_patterns: BTreeMap::new(),
            metadata_selectors: BTreeMap::new(),
        }
    }

    #[test]
    fn test_host_matching_exact_and_wildcard() {
        let mut src = source("a", "https://www.a.test/");
        src.allowed_domains = vec!["a.test".to_string(), "*.b.test".to_string()];

        assert!(src.matches_host("a.test"));
        assert!(src.matches_host("b.test"));
        assert!(src.matches_host("news.b.test"));
        assert!(src.matches_host("www.a.test")); // root URL host
        assert!(!src.matches_host("c.test"));
        assert!(!src.matches_host("evilb.test"));
    }

    #[test]
    fn test_rule_order_first_match_wins() {
        let mut src = source("a", "https://a.test/");
        src.rules = vec![
            SourceRule {
                pattern: "/archive/special".to_string(),
                action: RuleAction::Allow,
            },
            SourceRule {
                pattern: "/archive/".to_string(),
                action: RuleAction::Disallow,
            },
        ];

        assert!(src.is_url_allowed("https://a.test/archive/special/x"));
        assert!(!src.is_url_allowed("https://a.test/archive/2020"));
        assert!(src.is_url_allowed("https://a.test/news"));
    }

    #[test]
    fn test_validate_rejects_bad_sources() {
        assert!(source("", "https://a.test/").validate().is_err());
        assert!(source("a", "not a url").validate().is_err());

        let mut zero_parallel = source("a", "https://a.test/");
        zero_parallel.parallelism = 0;
        assert!(zero_parallel.validate().is_err());
    }

    #[test]
    fn test_default_patterns_cover_spec_table() {
        let patterns = default_content_type_patterns();
        assert!(patterns[&ContentType::Article].contains(&"/post/".to_string()));
        assert!(patterns[&ContentType::Job].contains(&"/careers/".to_string()));
        assert!(patterns.get(&ContentType::Html).is_none());
    }

    #[test]
    fn test_parse_sources_yaml() {
        let yaml = r#"
- name: news
  url: https://news.test/
  allowed_domains: ["news.test"]
  max_depth: 3
  rate_limit: 500ms
  parallelism: 4
  index_names:
    article: news_articles
    page: news_pages
  article_selectors:
    title: "h1.headline"
  rules:
    - pattern: "/tag/"
      action: disallow
- name: docs
  url: https://docs.test/
"#;
        let sources = parse_sources(yaml).expect("valid yaml");
        assert_eq!(sources.len(), 2);

        let news = &sources[0];
        assert_eq!(news.rate_limit, Duration::from_millis(500));
        assert_eq!(news.parallelism, 4);
        assert_eq!(news.index_for(ContentType::Article), Some("news_articles"));
        assert_eq!(news.article_selectors.title, "h1.headline");
        assert!(!news.is_url_allowed("https://news.test/tag/rust"));

        let docs = &sources[1];
        assert_eq!(docs.rate_limit, Duration::from_secs(2));
        assert_eq!(docs.parallelism, 2);
        assert_eq!(docs.index_for(ContentType::Article), None);
    }

    #[test]
    fn test_parse_sources_rejects_duplicate_names() {
        let yaml = r#"
- name: twin
  url: https://a.test/
- name: twin
  url: https://b.test/
"#;
        let err = parse_sources(yaml).expect_err("duplicate names");
        assert!(err.to_string().contains("twin"));
    }

    #[test]
    fn test_load_sources_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        std::io::Write::write_all(
            &mut file,
            b"- name: filed\n  url: https://filed.test/\n  rate_limit: 1s\n",
        )
        .expect("write yaml");

        let sources = load_sources(file.path()).expect("load");
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "filed");
    }

    #[test]
    fn test_load_sources_missing_file() {
        let err = load_sources("/definitely/not/here.yaml").expect_err("missing file");
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
