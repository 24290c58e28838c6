//! Read-only registry of active sources.

use crate::source::Source;
use url::Url;

/// Holds all sources for a run, frozen after startup.
///
/// Lookups lend out `&Source`; the registry is safe to share across tasks
/// without synchronization because it is never mutated.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<Source>) -> Self {
        Self { sources }
    }

    /// Look a source up by its unique name.
    pub fn find_by_name(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Match a raw URL to a source by host.
    ///
    /// A malformed URL yields `None`, never an error. First match wins in
    /// registry declaration order.
    pub fn find_by_url(&self, raw_url: &str) -> Option<&Source> {
        let host = Url::parse(raw_url).ok()?.host_str()?.to_string();
        self.sources.iter().find(|s| s.matches_host(&host))
    }

    /// All sources in declaration order.
    pub fn get_all(&self) -> &[Source] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::parse_sources;

    fn registry() -> SourceRegistry {
        let yaml = r#"
- name: news
  url: https://news.test/
  allowed_domains: ["news.test", "*.news.test"]
- name: blog
  url: https://blog.test/
"#;
        SourceRegistry::new(parse_sources(yaml).expect("valid yaml"))
    }

    #[test]
    fn test_find_by_name() {
        let registry = registry();
        assert!(registry.find_by_name("news").is_some());
        assert!(registry.find_by_name("missing").is_none());
    }

    #[test]
    fn test_find_by_url_matches_allowed_domains() {
        let registry = registry();
        let hit = registry.find_by_url("https://live.news.test/article/1");
        assert_eq!(hit.map(|s| s.name.as_str()), Some("news"));
    }

    #[test]
    fn test_find_by_url_falls_back_to_root_host() {
        let registry = registry();
        let hit = registry.find_by_url("https://blog.test/post/1");
        assert_eq!(hit.map(|s| s.name.as_str()), Some("blog"));
    }

    #[test]
    fn test_find_by_url_malformed_is_not_found() {
        let registry = registry();
        assert!(registry.find_by_url("not a url").is_none());
        assert!(registry.find_by_url("").is_none());
    }

    #[test]
    fn test_declaration_order_wins() {
        let yaml = r#"
- name: first
  url: https://shared.test/
- name: second
  url: https://shared.test/
"#;
        let registry = SourceRegistry::new(parse_sources(yaml).expect("valid yaml"));
        let hit = registry.find_by_url("https://shared.test/x");
        assert_eq!(hit.map(|s| s.name.as_str()), Some("first"));
    }
}
