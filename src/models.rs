//! Data models shared across the pipeline.
//!
//! This module defines the core data structures:
//! - [`Source`]: one configured origin from the registry
//! - [`Candidate`]: a raw extracted item, before change detection
//! - [`FetchedRecord`]: a classified-new item, persisted for summarization
//! - [`Summary`]: the summarizer's output merged with source metadata
//! - [`Badge`]: severity/category tag carried from source config through to
//!   the published card
//!
//! [`Candidate`] is ephemeral and never serialized; everything else crosses
//! a file boundary and derives serde.

use serde::{Deserialize, Serialize};

use crate::utils::slugify;

/// Raw text kept per record, capped so downstream LLM prompts stay bounded.
pub const RAW_TEXT_CAP: usize = 3000;

/// How a source's document is turned into candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    /// RSS syndication feed.
    Feed,
    /// Announcement/news listing page, scraped from HTML.
    Page,
}

/// Transport policy for one source, resolved once at registry load time.
///
/// `LegacyTls` exists for a small set of hosts whose TLS stacks cannot
/// complete a modern negotiation. It is only ever attached to exact
/// hostname matches from the registry's allowlist, never applied globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportPolicy {
    #[default]
    Standard,
    LegacyTls,
}

/// One configured origin the fetcher retrieves from.
///
/// Loaded from `sources.yaml` once per run and immutable after that. Only
/// sources with `active: true` participate in a run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Source {
    pub id: String,
    pub name: String,
    pub url: String,
    /// Topical domain, e.g. "taxation" or "immigration".
    pub domain: String,
    /// Trust tier of the source (1 = primary/official).
    pub tier: u8,
    /// Default badge applied when the summarizer doesn't override it.
    pub badge: Badge,
    pub topics: Vec<String>,
    pub fetch_strategy: FetchStrategy,
    pub active: bool,
    /// Resolved at load time from the legacy-TLS hostname allowlist; not
    /// part of the registry file.
    #[serde(skip, default)]
    pub transport: TransportPolicy,
}

/// A raw extracted item. Produced by the extractor, consumed by the change
/// detector, never persisted.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub title: String,
    pub raw_body: String,
    pub link: String,
}

/// A classified-new item, persisted for the summarizer.
///
/// The whole record set is overwritten wholesale each run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchedRecord {
    /// Display key `source_id-date-slug(title)`. Not guaranteed unique when
    /// two same-day titles slugify identically; the hash-cache key is the
    /// deduplication authority, never this field.
    pub id: String,
    pub source_id: String,
    pub source_name: String,
    pub source_url: String,
    pub domain: String,
    pub tier: u8,
    pub badge: Badge,
    pub topics: Vec<String>,
    pub title: String,
    /// Extracted body text, truncated to [`RAW_TEXT_CAP`] characters.
    pub raw_text: String,
    /// `YYYY-MM-DD` of the run that found this record.
    pub date_found: String,
    pub content_hash: String,
}

impl FetchedRecord {
    /// Derive the display id for a record found on `date`.
    pub fn derive_id(source_id: &str, date: &str, title: &str) -> String {
        format!("{}-{}-{}", source_id, date, slugify(title))
    }
}

/// Update severity/category tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Badge {
    /// Official update.
    #[serde(rename = "GREEN", alias = "green")]
    Green,
    /// Expert/advisory content.
    #[serde(rename = "ORANGE", alias = "orange")]
    Orange,
    /// Community-sourced.
    #[serde(rename = "BLUE", alias = "blue")]
    Blue,
    /// Urgent, action required. Triggers an alert on publish.
    #[serde(rename = "RED", alias = "red")]
    Red,
}

impl Badge {
    /// CSS class used by the published card markup.
    pub fn css_class(self) -> &'static str {
        match self {
            Badge::Green => "green",
            Badge::Orange => "orange",
            Badge::Blue => "blue",
            Badge::Red => "red",
        }
    }

    /// Human label shown on the published card.
    pub fn label(self) -> &'static str {
        match self {
            Badge::Green => "Official",
            Badge::Orange => "Expert",
            Badge::Blue => "Community",
            Badge::Red => "Alert",
        }
    }
}

/// A summarized announcement, ready for publication.
///
/// Produced by merging the summarizer's JSON payload with the record's
/// source metadata. The full list is persisted to `summaries.json` each run
/// and is the store the watchdog probes for emptiness.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Summary {
    pub id: String,
    pub source_id: String,
    pub source_name: String,
    pub source_url: String,
    pub domain: String,
    pub tier: u8,
    pub date: String,
    pub badge: Badge,
    pub title: String,
    /// One-sentence impact statement.
    pub so_what: String,
    /// Exactly three actionable bullet points.
    pub bullets: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_id_uses_slug() {
        let id = FetchedRecord::derive_id("rbi", "2025-07-01", "New FEMA Rules / Update");
        assert_eq!(id, "rbi-2025-07-01-new-fema-rules---update");
    }

    #[test]
    fn badge_roundtrips_uppercase() {
        let b: Badge = serde_json::from_str("\"RED\"").unwrap();
        assert_eq!(b, Badge::Red);
        assert_eq!(serde_json::to_string(&b).unwrap(), "\"RED\"");
    }

    #[test]
    fn badge_accepts_lowercase_registry_values() {
        let b: Badge = serde_json::from_str("\"green\"").unwrap();
        assert_eq!(b, Badge::Green);
    }
}
