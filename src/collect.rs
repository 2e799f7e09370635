//! The run collector: registry order in, persisted records out.
//!
//! Sources are processed strictly sequentially. A per-source fetch or
//! extract failure is logged and contained; the run moves on to the next
//! source. Once the global cap of new records is reached, remaining
//! sources are skipped entirely, including their pacing delay.
//!
//! Persistence happens once, at the end: the full record list replaces the
//! record store, then the merged hash cache replaces the cache store. Until
//! that point nothing this run discovered has touched disk, so a failed run
//! cannot poison the cache.

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::detect::{Classification, HashCache, classify};
use crate::errors::PersistenceError;
use crate::extract;
use crate::fetch::Fetch;
use crate::models::{FetchedRecord, Source};
use crate::store;
use crate::utils::truncate_for_log;

/// Global cap on new records per run.
pub const MAX_NEW_ITEMS: usize = 5;

/// Run the collection phase across all active sources and persist the
/// results. Returns the new records, in discovery order.
pub async fn collect(
    config: &AppConfig,
    sources: &[Source],
    fetcher: &dyn Fetch,
) -> Result<Vec<FetchedRecord>, PersistenceError> {
    let mut cache = HashCache::new(store::load_cache(&config.cache_path()).await?);
    let today = chrono::Local::now().date_naive().to_string();
    let mut records: Vec<FetchedRecord> = Vec::new();

    info!(sources = sources.len(), "collector started");

    for source in sources {
        if records.len() >= MAX_NEW_ITEMS {
            info!(cap = MAX_NEW_ITEMS, "new-item cap reached; skipping remaining sources");
            break;
        }

        info!(source = %source.id, url = %source.url, "fetching");
        let document = match fetcher.fetch(source).await {
            Ok(body) => body,
            Err(e) => {
                warn!(source = %source.id, error = %e, "fetch failed; continuing");
                continue;
            }
        };

        let candidates = match extract::extract(&document, source) {
            Ok(c) => c,
            Err(e) => {
                warn!(source = %source.id, error = %e, "extraction failed; treating as empty");
                Vec::new()
            }
        };
        if candidates.is_empty() {
            warn!(source = %source.id, "no candidates found");
            continue;
        }

        for candidate in &candidates {
            if records.len() >= MAX_NEW_ITEMS {
                break;
            }
            match classify(source, candidate, &today, &mut cache) {
                Classification::New(record) => {
                    info!(source = %source.id, title = %truncate_for_log(&record.title, 60), "NEW");
                    records.push(record);
                }
                Classification::Unchanged => {
                    info!(source = %source.id, title = %truncate_for_log(&candidate.title, 60), "unchanged");
                }
                Classification::TooShort => {
                    debug!(source = %source.id, title = %truncate_for_log(&candidate.title, 60), "too short; dropped");
                }
            }
        }

        if records.len() < MAX_NEW_ITEMS {
            sleep(config.pacing).await;
        }
    }

    let staged = cache.staged_count();
    store::write_records(&config.records_path(), &records).await?;
    store::write_cache(&config.cache_path(), &cache.into_merged()).await?;

    info!(new = records.len(), staged, "collector done");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::errors::FetchError;
    use crate::models::{Badge, FetchStrategy, TransportPolicy};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct StubFetcher {
        bodies: HashMap<String, String>,
        calls: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        fn new(bodies: &[(&str, &str)]) -> Self {
            Self {
                bodies: bodies
                    .iter()
                    .map(|(id, body)| (id.to_string(), body.to_string()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetch for StubFetcher {
        async fn fetch(&self, source: &Source) -> Result<String, FetchError> {
            self.calls.lock().unwrap().push(source.id.clone());
            self.bodies.get(&source.id).cloned().ok_or(FetchError::Status {
                url: source.url.clone(),
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                attempts: 3,
            })
        }
    }

    fn feed_source(id: &str) -> Source {
        Source {
            id: id.into(),
            name: format!("Source {id}"),
            url: format!("https://{id}.gov.in/feed"),
            domain: "taxation".into(),
            tier: 1,
            badge: Badge::Green,
            topics: vec![],
            fetch_strategy: FetchStrategy::Feed,
            active: true,
            transport: TransportPolicy::Standard,
        }
    }

    fn feed_with(n: usize) -> String {
        let items: String = (0..n)
            .map(|i| {
                format!(
                    "<item><title>Announcement {i} with a sufficiently long title</title>\
                     <link>https://x.gov.in/{i}</link>\
                     <description>Detailed body text for announcement number {i}.</description></item>"
                )
            })
            .collect();
        format!("<rss version=\"2.0\"><channel>{items}</channel></rss>")
    }

    fn unique_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("aw-collect-{tag}-{}", std::process::id()));
        std::fs::remove_dir_all(&dir).ok();
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn cap_holds_for_any_candidate_volume() {
        let dir = unique_dir("cap");
        let config = test_config(&dir);
        // A feed may carry many entries, but extraction bounds each source
        // to 5 candidates, and the run cap bounds the total.
        let sources = vec![feed_source("a"), feed_source("b"), feed_source("c")];
        let fetcher = StubFetcher::new(&[
            ("a", &feed_with(20)),
            ("b", &feed_with(20)),
            ("c", &feed_with(20)),
        ]);

        let records = collect(&config, &sources, &fetcher).await.unwrap();
        assert_eq!(records.len(), MAX_NEW_ITEMS);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn sources_after_cap_are_not_fetched() {
        let dir = unique_dir("skip");
        let config = test_config(&dir);
        let sources = vec![feed_source("a"), feed_source("b")];
        let fetcher = StubFetcher::new(&[("a", &feed_with(8)), ("b", &feed_with(8))]);

        let records = collect(&config, &sources, &fetcher).await.unwrap();
        assert_eq!(records.len(), MAX_NEW_ITEMS);
        // "a" alone satisfies the cap, so "b" is never touched.
        assert_eq!(fetcher.calls(), vec!["a".to_string()]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn one_failing_source_does_not_abort_the_run() {
        let dir = unique_dir("contain");
        let config = test_config(&dir);
        let sources = vec![feed_source("down"), feed_source("up")];
        // "down" has no stubbed body and fails with a 503.
        let fetcher = StubFetcher::new(&[("up", &feed_with(2))]);

        let records = collect(&config, &sources, &fetcher).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(fetcher.calls(), vec!["down".to_string(), "up".to_string()]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn malformed_document_counts_as_zero_candidates() {
        let dir = unique_dir("malformed");
        let config = test_config(&dir);
        let sources = vec![feed_source("bad"), feed_source("good")];
        let fetcher =
            StubFetcher::new(&[("bad", "<html>not xml</html>"), ("good", &feed_with(1))]);

        let records = collect(&config, &sources, &fetcher).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_id, "good");
        std::fs::remove_dir_all(&dir).ok();
    }
}
