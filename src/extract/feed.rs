//! RSS feed extraction.
//!
//! Feeds are deserialized with quick-xml's serde support. Per entry, the
//! body prefers `<summary>` (some government feeds emit Atom-flavored
//! elements inside RSS channels) and falls back to `<description>`; the
//! link falls back to the source URL. Markup inside either body field is
//! stripped before hashing-relevant text leaves this module.

use quick_xml::de::from_str;
use serde::Deserialize;

use crate::errors::ExtractError;
use crate::models::Candidate;
use crate::utils::strip_markup;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    summary: Option<String>,
    description: Option<String>,
}

/// Parse a feed document into candidates.
pub fn extract(document: &str, source_url: &str) -> Result<Vec<Candidate>, ExtractError> {
    let rss: Rss = from_str(document)?;

    let candidates = rss
        .channel
        .items
        .into_iter()
        .map(|item| {
            let body_html = item.summary.or(item.description).unwrap_or_default();
            Candidate {
                title: item.title.unwrap_or_default(),
                raw_body: strip_markup(&body_html),
                link: item.link.unwrap_or_else(|| source_url.to_string()),
            }
        })
        .collect();

    Ok(candidates)
}
