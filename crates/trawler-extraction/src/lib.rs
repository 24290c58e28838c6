//! HTML extraction for the Trawler crawler.
//!
//! Everything in this crate is CPU-only and synchronous: documents are
//! parsed with `scraper` and walked with per-source CSS selectors. The
//! async pipeline hands HTML strings in and gets typed records back.

pub mod article;
pub mod dates;
pub mod detect;
pub mod jsonld;
pub mod metadata;
pub mod page;
pub mod process;
pub mod select;

pub use article::{extract_article, extract_article_from_html};
pub use dates::parse_published_date;
pub use detect::{detect_content_type, detect_document};
pub use jsonld::extract_json_ld_type;
pub use metadata::extract_metadata;
pub use page::{extract_page, extract_page_from_html};
pub use process::{process, process_batch, process_with_metadata};
