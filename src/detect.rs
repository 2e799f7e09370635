//! Change detection over a persistent content-hash cache.
//!
//! Every candidate is classified against the cache of everything seen in
//! previous runs. New content is staged on the cache rather than committed:
//! the run collector persists the merged cache in one shot at the end of a
//! successful run, so a crash mid-run never leaves half a run's hashes
//! behind (which would silently swallow those items forever).

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::models::{Candidate, FetchedRecord, RAW_TEXT_CAP, Source};
use crate::utils::{slugify, truncate_chars};

/// Candidates whose combined title + body is shorter than this are noise
/// (empty teasers, nav fragments) and are dropped before hashing.
pub const MIN_COMBINED_LEN: usize = 50;

/// Outcome of classifying one candidate.
#[derive(Debug)]
pub enum Classification {
    /// Unseen content; the record is ready to persist and the cache entry
    /// has been staged.
    New(FetchedRecord),
    /// Same key and digest as a previous run.
    Unchanged,
    /// Below [`MIN_COMBINED_LEN`]; not hashed, not cached, not emitted.
    TooShort,
}

/// The content-hash cache: committed entries from previous runs plus
/// entries staged during this run.
///
/// Keys are `source_id:slug(title)`, values are SHA-256 hex digests.
/// Entries are never deleted.
#[derive(Debug, Default)]
pub struct HashCache {
    persisted: BTreeMap<String, String>,
    staged: BTreeMap<String, String>,
}

impl HashCache {
    pub fn new(persisted: BTreeMap<String, String>) -> Self {
        Self {
            persisted,
            staged: BTreeMap::new(),
        }
    }

    /// Look up a key, seeing this run's staged entries as well so a
    /// candidate repeated within one run classifies as unchanged.
    fn get(&self, key: &str) -> Option<&String> {
        self.staged.get(key).or_else(|| self.persisted.get(key))
    }

    fn stage(&mut self, key: String, digest: String) {
        self.staged.insert(key, digest);
    }

    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    /// Consume the cache into the mapping to persist: previous entries
    /// merged with everything staged this run.
    pub fn into_merged(self) -> BTreeMap<String, String> {
        let mut merged = self.persisted;
        merged.extend(self.staged);
        merged
    }
}

/// SHA-256 hex digest of the combined candidate text.
pub fn content_hash(combined: &str) -> String {
    let digest = Sha256::digest(combined.as_bytes());
    format!("{digest:x}")
}

/// Cache key for a candidate title under a source.
pub fn cache_key(source_id: &str, title: &str) -> String {
    format!("{}:{}", source_id, slugify(title))
}

/// Classify one candidate against the cache, staging the hash when new.
pub fn classify(
    source: &Source,
    candidate: &Candidate,
    date_found: &str,
    cache: &mut HashCache,
) -> Classification {
    let combined = format!("{}{}", candidate.title, candidate.raw_body)
        .trim()
        .to_string();
    if combined.chars().count() < MIN_COMBINED_LEN {
        return Classification::TooShort;
    }

    let digest = content_hash(&combined);
    let key = cache_key(&source.id, &candidate.title);

    if cache.get(&key) == Some(&digest) {
        return Classification::Unchanged;
    }

    let record = FetchedRecord {
        id: FetchedRecord::derive_id(&source.id, date_found, &candidate.title),
        source_id: source.id.clone(),
        source_name: source.name.clone(),
        source_url: candidate.link.clone(),
        domain: source.domain.clone(),
        tier: source.tier,
        badge: source.badge,
        topics: source.topics.clone(),
        title: candidate.title.clone(),
        raw_text: truncate_chars(&candidate.raw_body, RAW_TEXT_CAP),
        date_found: date_found.to_string(),
        content_hash: digest.clone(),
    };

    cache.stage(key, digest);
    Classification::New(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Badge, FetchStrategy, TransportPolicy};

    fn source(id: &str) -> Source {
        Source {
            id: id.into(),
            name: "Test Source".into(),
            url: "https://example.gov.in".into(),
            domain: "taxation".into(),
            tier: 1,
            badge: Badge::Green,
            topics: vec!["tds".into()],
            fetch_strategy: FetchStrategy::Feed,
            active: true,
            transport: TransportPolicy::Standard,
        }
    }

    fn candidate(title: &str, body: &str) -> Candidate {
        Candidate {
            title: title.into(),
            raw_body: body.into(),
            link: "https://example.gov.in/item".into(),
        }
    }

    const BODY: &str = "The central board has notified revised thresholds for deduction.";

    #[test]
    fn unseen_content_is_new_and_staged() {
        let mut cache = HashCache::default();
        let c = candidate("Revised TDS thresholds", BODY);

        match classify(&source("cbdt"), &c, "2025-07-01", &mut cache) {
            Classification::New(record) => {
                assert_eq!(record.source_id, "cbdt");
                assert_eq!(record.title, "Revised TDS thresholds");
                assert_eq!(record.content_hash.len(), 64);
            }
            other => panic!("expected New, got {other:?}"),
        }
        assert_eq!(cache.staged_count(), 1);
    }

    #[test]
    fn second_pass_over_same_content_is_unchanged() {
        let mut cache = HashCache::default();
        let c = candidate("Revised TDS thresholds", BODY);
        let src = source("cbdt");

        assert!(matches!(
            classify(&src, &c, "2025-07-01", &mut cache),
            Classification::New(_)
        ));

        // Re-run over the committed cache: no new classifications.
        let mut next_run = HashCache::new(cache.into_merged());
        assert!(matches!(
            classify(&src, &c, "2025-07-02", &mut next_run),
            Classification::Unchanged
        ));
        assert_eq!(next_run.staged_count(), 0);
    }

    #[test]
    fn changed_body_under_same_title_is_new_again() {
        let mut cache = HashCache::default();
        let src = source("cbdt");

        classify(&src, &candidate("Revised TDS thresholds", BODY), "2025-07-01", &mut cache);
        let mut next_run = HashCache::new(cache.into_merged());

        let updated = candidate(
            "Revised TDS thresholds",
            "The board has further amended the thresholds effective October.",
        );
        assert!(matches!(
            classify(&src, &updated, "2025-07-02", &mut next_run),
            Classification::New(_)
        ));
    }

    #[test]
    fn short_content_is_never_hashed_or_cached() {
        let mut cache = HashCache::default();
        let c = candidate("Tiny", "too short");

        assert!(matches!(
            classify(&source("cbdt"), &c, "2025-07-01", &mut cache),
            Classification::TooShort
        ));
        assert_eq!(cache.staged_count(), 0);
        assert!(cache.into_merged().is_empty());
    }

    #[test]
    fn same_slug_under_different_sources_does_not_collide() {
        let mut cache = HashCache::default();
        let c = candidate("Annual compliance calendar published", BODY);

        assert!(matches!(
            classify(&source("rbi"), &c, "2025-07-01", &mut cache),
            Classification::New(_)
        ));
        assert!(matches!(
            classify(&source("sebi"), &c, "2025-07-01", &mut cache),
            Classification::New(_)
        ));
        assert_eq!(cache.staged_count(), 2);
    }

    #[test]
    fn hash_is_deterministic() {
        let text = "Fixed input text for digest stability.";
        assert_eq!(content_hash(text), content_hash(text));
        assert_eq!(
            content_hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
