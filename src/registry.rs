//! Source registry loading.
//!
//! The registry is an ordered YAML list of [`Source`] records, read once at
//! the start of a run. Loading also resolves each source's transport
//! policy, so the fetcher never consults hostname lists at request time.

use std::path::Path;

use tracing::{info, warn};
use url::Url;

use crate::errors::PipelineError;
use crate::models::{Source, TransportPolicy};

/// Hosts whose TLS stacks cannot complete a modern negotiation. Matched
/// against the exact hostname of the source URL, nothing looser.
const LEGACY_TLS_HOSTS: &[&str] = &["www.passportindia.gov.in"];

/// Load the registry, keeping only active sources in file order.
pub fn load(path: &Path) -> Result<Vec<Source>, PipelineError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| PipelineError::Registry(format!("read {}: {e}", path.display())))?;
    let all: Vec<Source> = serde_yaml::from_str(&raw)
        .map_err(|e| PipelineError::Registry(format!("parse {}: {e}", path.display())))?;

    let total = all.len();
    let mut sources: Vec<Source> = all.into_iter().filter(|s| s.active).collect();
    for source in &mut sources {
        source.transport = resolve_transport(&source.url);
        if source.transport == TransportPolicy::LegacyTls {
            warn!(source = %source.id, url = %source.url, "using relaxed TLS policy for legacy host");
        }
    }

    info!(active = sources.len(), total, path = %path.display(), "loaded source registry");
    Ok(sources)
}

/// Resolve the transport policy for a source URL at load time.
fn resolve_transport(url: &str) -> TransportPolicy {
    let host = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string));
    match host {
        Some(h) if LEGACY_TLS_HOSTS.contains(&h.as_str()) => TransportPolicy::LegacyTls,
        _ => TransportPolicy::Standard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Badge, FetchStrategy};

    const REGISTRY_YAML: &str = r#"
- id: rbi
  name: Reserve Bank of India
  url: https://www.rbi.org.in/pressreleases.rss
  domain: banking
  tier: 1
  badge: GREEN
  topics: [fema, remittance]
  fetch_strategy: feed
  active: true
- id: passport
  name: Passport Seva
  url: https://www.passportindia.gov.in/AppOnlineProject/welcomeLink
  domain: documentation
  tier: 1
  badge: GREEN
  topics: [passport]
  fetch_strategy: page
  active: true
- id: retired
  name: Old Portal
  url: https://example.gov.in/old
  domain: misc
  tier: 2
  badge: BLUE
  topics: []
  fetch_strategy: page
  active: false
"#;

    fn write_registry(tag: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("aw-registry-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sources.yaml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_active_sources_in_order() {
        let path = write_registry("order", REGISTRY_YAML);
        let sources = load(&path).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].id, "rbi");
        assert_eq!(sources[0].fetch_strategy, FetchStrategy::Feed);
        assert_eq!(sources[0].badge, Badge::Green);
        assert_eq!(sources[1].id, "passport");
    }

    #[test]
    fn legacy_tls_scoped_to_exact_host() {
        let path = write_registry("tls", REGISTRY_YAML);
        let sources = load(&path).unwrap();
        assert_eq!(sources[0].transport, TransportPolicy::Standard);
        assert_eq!(sources[1].transport, TransportPolicy::LegacyTls);
    }

    #[test]
    fn lookalike_host_is_not_legacy() {
        assert_eq!(
            resolve_transport("https://evil.www.passportindia.gov.in.example.com/"),
            TransportPolicy::Standard
        );
        assert_eq!(
            resolve_transport("https://passportindia.gov.in/"),
            TransportPolicy::Standard
        );
    }

    #[test]
    fn missing_registry_is_an_error() {
        let err = load(Path::new("/nonexistent/sources.yaml")).unwrap_err();
        assert!(matches!(err, PipelineError::Registry(_)));
    }
}
