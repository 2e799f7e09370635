//! HTML page extraction.
//!
//! Government announcement pages share no common markup, so extraction
//! walks a fixed priority list of strategies and stops at the first one
//! that yields at least one candidate; results from different strategies
//! are never merged:
//!
//! 1. semantic `article` containers
//! 2. announcement-class containers (`.announcement`, `.news-item`,
//!    `.press-release`, `.update`)
//! 3. list-item containers (`li.item`, `li.news`)
//! 4. fallback: `h2`/`h3`/`h4` headings paired with the next sibling
//!    paragraph or div
//!
//! Relative links are resolved against the source's origin (scheme + host).

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::MAX_CANDIDATES;
use crate::models::Candidate;

/// One entry in the priority list.
enum PageStrategy {
    /// Candidate-per-element for a container selector.
    Containers(&'static str),
    /// Heading + next-sibling-paragraph pairs.
    HeadingPairs,
}

const STRATEGY_ORDER: &[PageStrategy] = &[
    PageStrategy::Containers("article"),
    PageStrategy::Containers(".announcement, .news-item, .press-release, .update"),
    PageStrategy::Containers("li.item, li.news"),
    PageStrategy::HeadingPairs,
];

/// Headings shorter than this are navigation chrome, not announcements.
const MIN_HEADING_LEN: usize = 20;

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Extract candidates from an HTML listing page. Never fails; a page with
/// no recognizable structure yields an empty list.
pub fn extract(document: &str, source_url: &str) -> Vec<Candidate> {
    let html = Html::parse_document(document);
    let origin = origin_of(source_url);

    for strategy in STRATEGY_ORDER {
        let candidates = match strategy {
            PageStrategy::Containers(css) => {
                from_containers(&html, css, source_url, origin.as_ref())
            }
            PageStrategy::HeadingPairs => from_heading_pairs(&html, source_url),
        };
        if !candidates.is_empty() {
            return candidates;
        }
    }

    Vec::new()
}

fn from_containers(
    html: &Html,
    css: &str,
    source_url: &str,
    origin: Option<&Url>,
) -> Vec<Candidate> {
    let container_sel = Selector::parse(css).unwrap();
    let title_sel = Selector::parse("h2, h3, h4, a").unwrap();
    let link_sel = Selector::parse("a[href]").unwrap();

    html.select(&container_sel)
        .take(MAX_CANDIDATES)
        .map(|el| {
            let title = match el.select(&title_sel).next() {
                Some(t) => text_of(t),
                None => crate::utils::truncate_chars(&text_of(el), 80),
            };
            let link = el
                .select(&link_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(|href| resolve_link(href, origin, source_url))
                .unwrap_or_else(|| source_url.to_string());

            Candidate {
                title,
                raw_body: text_of(el),
                link,
            }
        })
        .collect()
}

fn from_heading_pairs(html: &Html, source_url: &str) -> Vec<Candidate> {
    let heading_sel = Selector::parse("h2, h3, h4").unwrap();

    html.select(&heading_sel)
        .filter_map(|heading| {
            let title = text_of(heading);
            if title.len() <= MIN_HEADING_LEN {
                return None;
            }
            Some(Candidate {
                title,
                raw_body: sibling_paragraph(heading).unwrap_or_default(),
                link: source_url.to_string(),
            })
        })
        .take(MAX_CANDIDATES)
        .collect()
}

/// First following sibling that is a `<p>` or `<div>`, as text.
fn sibling_paragraph(heading: ElementRef<'_>) -> Option<String> {
    heading
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| matches!(el.value().name(), "p" | "div"))
        .map(|el| text_of(el))
}

fn text_of(el: ElementRef<'_>) -> String {
    let joined = el.text().collect::<Vec<_>>().join(" ");
    RE_WS.replace_all(joined.trim(), " ").to_string()
}

/// Scheme + host of the source URL, used as the base for relative links.
fn origin_of(source_url: &str) -> Option<Url> {
    let mut url = Url::parse(source_url).ok()?;
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Some(url)
}

fn resolve_link(href: &str, origin: Option<&Url>, source_url: &str) -> String {
    if Url::parse(href).is_ok() {
        return href.to_string();
    }
    origin
        .and_then(|base| base.join(href).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| source_url.to_string())
}
