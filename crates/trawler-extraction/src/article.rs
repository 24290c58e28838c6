//! Article extraction.

use scraper::{Html, Selector};
use tracing::debug;
use trawler_config::ArticleSelectors;
use trawler_types::{url_fingerprint, Article};

use crate::dates::parse_published_date;
use crate::select::{
    apply_excludes, extract_attr, extract_meta, extract_meta_name, extract_text, extract_text_all,
    full_text, split_list, split_selector,
};

/// Attributes tried, in order, when resolving a configured article ID.
const ID_ATTRIBUTES: &[&str] = &["data-article-id", "data-post-id", "id"];

/// Body fallback used when neither the container nor the body selector
/// produced text.
const BODY_FALLBACK: &str = "article, main, .article-content, .article-body";

/// Extract an article from a parsed document.
///
/// Each field follows its own fallback chain; the record is returned
/// un-normalized and callers run `prepare_for_indexing` before handing it
/// to the indexer.
pub fn extract_article(document: &Html, url: &str, selectors: &ArticleSelectors) -> Article {
    let mut article = Article::new(resolve_id(document, url, selectors), url);

    article.title = or_else(extract_text(document, &selectors.title), || {
        extract_meta(document, "og:title")
    });
    article.body = extract_body(document, selectors);
    article.intro = or_else(extract_text(document, &selectors.intro), || {
        extract_meta(document, "og:description")
    });
    article.author = or_else(extract_text(document, &selectors.author), || {
        extract_meta(document, "article:author")
    });
    article.byline_name = or_else(extract_text(document, &selectors.byline_name), || {
        extract_text(document, &selectors.byline)
    });

    let published_raw = or_else(
        extract_attr(document, &selectors.published_time, "datetime"),
        || {
            or_else(extract_text(document, &selectors.published_time), || {
                extract_meta(document, "article:published_time")
            })
        },
    );
    article.published_date = parse_published_date(&published_raw);

    let keywords_raw = or_else(extract_text(document, &selectors.keywords), || {
        extract_meta_name(document, "keywords")
    });
    article.keywords = split_list(&keywords_raw);

    let tags: Vec<String> = extract_text_all(document, &selectors.tags)
        .iter()
        .flat_map(|t| split_list(t))
        .collect();
    // a source without tag markup inherits its keyword list
    article.tags = if tags.is_empty() {
        article.keywords.clone()
    } else {
        tags
    };

    article.og_title = extract_meta(document, "og:title");
    article.og_description = extract_meta(document, "og:description");
    article.og_image = extract_meta(document, "og:image");
    article.og_url = extract_meta(document, "og:url");
    article.og_type = extract_meta(document, "og:type");
    article.og_site_name = extract_meta(document, "og:site_name");

    article.description = or_else(extract_meta_name(document, "description"), || {
        article.intro.clone()
    });
    article.section = or_else(extract_text(document, &selectors.section), || {
        extract_meta(document, "article:section")
    });
    article.category = or_else(extract_text(document, &selectors.category), || {
        extract_meta(document, "article:section")
    });
    article.canonical_url = extract_attr(document, &selectors.canonical, "href");

    debug!(
        url = %url,
        title_len = article.title.len(),
        body_len = article.body.len(),
        "Extracted article"
    );
    article
}

/// Parse and extract in one call.
pub fn extract_article_from_html(html: &str, url: &str, selectors: &ArticleSelectors) -> Article {
    let document = Html::parse_document(html);
    extract_article(&document, url, selectors)
}

fn resolve_id(document: &Html, url: &str, selectors: &ArticleSelectors) -> String {
    if !selectors.article_id.is_empty() {
        for attr in ID_ATTRIBUTES {
            let value = extract_attr(document, &selectors.article_id, attr);
            if !value.is_empty() {
                return value;
            }
        }
    }
    url_fingerprint(url)
}

/// Container-scoped body extraction with exclude stripping.
fn extract_body(document: &Html, selectors: &ArticleSelectors) -> String {
    let mut scoped = document.clone();
    apply_excludes(&mut scoped, &selectors.exclude);

    if !selectors.container.is_empty() {
        for sub in split_selector(&selectors.container) {
            let Ok(parsed) = Selector::parse(sub) else {
                continue;
            };
            if let Some(container) = scoped.select(&parsed).next() {
                let text = full_text(container);
                if !text.is_empty() {
                    return text;
                }
            }
        }
    }

    let body = extract_text(&scoped, &selectors.body);
    if !body.is_empty() {
        return body;
    }
    extract_text(&scoped, BODY_FALLBACK)
}

fn or_else(primary: String, fallback: impl FnOnce() -> String) -> String {
    if primary.is_empty() {
        fallback()
    } else {
        primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectors() -> ArticleSelectors {
        ArticleSelectors {
            title: "h1".to_string(),
            body: "article".to_string(),
            ..ArticleSelectors::default()
        }
    }

    #[test]
    fn test_happy_article() {
        let html = "<html><head><title>T</title>\
                    <meta property=\"og:url\" content=\"https://a.test/x\"></head>\
                    <body><h1>Hi</h1><article>Body text</article></body></html>";
        let mut article =
            extract_article_from_html(html, "https://a.test/x", &selectors());
        article.prepare_for_indexing();

        assert_eq!(article.id, url_fingerprint("https://a.test/x"));
        assert_eq!(article.title, "Hi");
        assert_eq!(article.body, "Body text");
        assert_eq!(article.og_url, "https://a.test/x");
        assert_eq!(article.canonical_url, "https://a.test/x");
        assert_eq!(article.word_count, 2);
    }

    #[test]
    fn test_exclude_enforcement() {
        let html = "<article>Keep<div class=\"ads\">Drop</div></article>";
        let mut sel = selectors();
        sel.exclude = vec![".ads".to_string()];
        let article = extract_article_from_html(html, "https://a.test/x", &sel);
        assert_eq!(article.body, "Keep");
    }

    #[test]
    fn test_container_scoped_body() {
        let html = "<div class=\"post\"><p>In container</p>\
                    <div class=\"ads\">Out</div></div>\
                    <article>Elsewhere</article>";
        let mut sel = selectors();
        sel.container = ".post".to_string();
        sel.exclude = vec![".ads".to_string()];
        let article = extract_article_from_html(html, "https://a.test/x", &sel);
        assert_eq!(article.body, "In container");
    }

    #[test]
    fn test_body_fallback_chain() {
        let html = "<main>From main</main>";
        let article = extract_article_from_html(html, "https://a.test/x", &selectors());
        assert_eq!(article.body, "From main");
    }

    #[test]
    fn test_title_falls_back_to_og() {
        let html = "<head><meta property=\"og:title\" content=\"OG title\"></head><body></body>";
        let article = extract_article_from_html(html, "https://a.test/x", &selectors());
        assert_eq!(article.title, "OG title");
    }

    #[test]
    fn test_configured_article_id_wins() {
        let html = "<article data-article-id=\"abc-123\">Body</article>";
        let article = extract_article_from_html(html, "https://a.test/x", &selectors());
        assert_eq!(article.id, "abc-123");
    }

    #[test]
    fn test_keyword_and_tag_dedup() {
        let html = "<span class=\"keywords\">a, b, b</span>\
                    <span class=\"taglist\">b,c</span>";
        let mut sel = selectors();
        sel.keywords = ".keywords".to_string();
        sel.tags = ".taglist".to_string();
        let mut article = extract_article_from_html(html, "https://a.test/x", &sel);
        article.prepare_for_indexing();

        assert_eq!(article.keywords, vec!["a", "b"]);
        assert_eq!(article.tags, vec!["b", "c"]);
    }

    #[test]
    fn test_tags_inherit_keywords_when_absent() {
        let html = "<meta name=\"keywords\" content=\"x, y\">";
        let mut article = extract_article_from_html(html, "https://a.test/x", &selectors());
        article.prepare_for_indexing();
        assert_eq!(article.tags, vec!["x", "y"]);
    }

    #[test]
    fn test_published_date_prefers_datetime_attr() {
        let html = "<time datetime=\"2024-03-01T10:00:00Z\">March 1st, 2024</time>";
        let article = extract_article_from_html(html, "https://a.test/x", &selectors());
        assert!(article.published_date.is_some());
    }

    #[test]
    fn test_published_date_from_meta() {
        let html = "<head><meta property=\"article:published_time\" \
                    content=\"2024-03-01T10:00:00Z\"></head>";
        let article = extract_article_from_html(html, "https://a.test/x", &selectors());
        assert!(article.published_date.is_some());
    }

    #[test]
    fn test_description_meta_then_intro() {
        let html = "<div class=\"article-intro\">Lead text</div>";
        let article = extract_article_from_html(html, "https://a.test/x", &selectors());
        assert_eq!(article.description, "Lead text");
    }
}
