//! Generic page extraction.

use scraper::Html;
use tracing::debug;
use trawler_config::PageSelectors;
use trawler_types::{url_fingerprint, Page};

use crate::select::{
    apply_excludes, extract_attr, extract_meta, extract_meta_name, extract_text, split_list,
};

/// Extract a generic page from a parsed document.
///
/// Excluded subtrees are stripped up front, then every field follows its
/// fallback chain. The record is returned un-normalized.
pub fn extract_page(document: &Html, url: &str, selectors: &PageSelectors) -> Page {
    let mut scoped = document.clone();
    apply_excludes(&mut scoped, &selectors.exclude);

    let mut page = Page::new(url_fingerprint(url), url);

    page.title = chain(&[
        extract_text(&scoped, &selectors.title),
        extract_meta(&scoped, "og:title"),
        extract_text(&scoped, "title"),
    ]);
    page.content = chain(&[
        extract_text(&scoped, &selectors.content),
        extract_text(&scoped, "main"),
        extract_text(&scoped, "article"),
        extract_text(&scoped, "body"),
    ]);
    page.description = chain(&[
        extract_text(&scoped, &selectors.description),
        extract_meta_name(&scoped, "description"),
        extract_meta(&scoped, "og:description"),
    ]);

    let keywords_raw = chain(&[
        extract_text(&scoped, &selectors.keywords),
        extract_meta_name(&scoped, "keywords"),
    ]);
    page.keywords = split_list(&keywords_raw);

    page.og_title = chain(&[
        extract_text(&scoped, &selectors.og_title),
        extract_meta(&scoped, "og:title"),
    ]);
    page.og_description = chain(&[
        extract_text(&scoped, &selectors.og_description),
        extract_meta(&scoped, "og:description"),
    ]);
    page.og_image = chain(&[
        extract_attr(&scoped, &selectors.og_image, "content"),
        extract_meta(&scoped, "og:image"),
    ]);
    page.og_url = chain(&[
        extract_attr(&scoped, &selectors.og_url, "content"),
        extract_meta(&scoped, "og:url"),
    ]);
    page.og_type = chain(&[
        extract_text(&scoped, &selectors.og_type),
        extract_meta(&scoped, "og:type"),
    ]);
    page.og_site_name = chain(&[
        extract_text(&scoped, &selectors.og_site_name),
        extract_meta(&scoped, "og:site_name"),
    ]);

    page.canonical_url = chain(&[
        extract_attr(&scoped, &selectors.canonical, "href"),
        extract_attr(&scoped, "link[rel=\"canonical\"]", "href"),
    ]);

    debug!(url = %url, title_len = page.title.len(), "Extracted page");
    page
}

/// Parse and extract in one call.
pub fn extract_page_from_html(html: &str, url: &str, selectors: &PageSelectors) -> Page {
    let document = Html::parse_document(html);
    extract_page(&document, url, selectors)
}

fn chain(candidates: &[String]) -> String {
    candidates
        .iter()
        .find(|c| !c.is_empty())
        .cloned()
        .unwrap_or_default()
}
