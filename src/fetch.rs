//! HTTP retrieval with retry, backoff, and per-source transport policy.
//!
//! One GET per source, up to [`MAX_ATTEMPTS`] tries. Retries cover the
//! transient status classes (429 and the 5xx gateway family) and
//! connection-level failures; other client errors fail fast. The delay
//! between attempts doubles from [`BASE_DELAY`] up to [`MAX_DELAY`] with
//! 0–250ms of random jitter.
//!
//! Sources whose registry entry resolved to [`TransportPolicy::LegacyTls`]
//! are fetched with a second, relaxed client. That client is built once and
//! reached only through the policy field; no hostname matching happens
//! here.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::{Rng, rng};
use reqwest::{Client, StatusCode};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::errors::FetchError;
use crate::models::{Source, TransportPolicy};

const MAX_ATTEMPTS: usize = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const BASE_DELAY: Duration = Duration::from_secs(1);
const MAX_DELAY: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; AnnounceWatch-Bot/",
    env!("CARGO_PKG_VERSION"),
    "; +https://github.com/announce-watch/announce_watch)"
);

/// Retrieval seam between the collector and the network.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch one source's document body.
    async fn fetch(&self, source: &Source) -> Result<String, FetchError>;
}

/// Production fetcher backed by two reqwest clients.
pub struct HttpFetcher {
    standard: Client,
    legacy: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let standard = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .expect("reqwest client");

        // Degraded verification for hosts that cannot negotiate modern TLS.
        // Only reachable via TransportPolicy::LegacyTls, which the registry
        // grants to exact hostname matches.
        let legacy = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(true)
            .build()
            .expect("reqwest legacy client");

        Self { standard, legacy }
    }

    fn client_for(&self, source: &Source) -> &Client {
        match source.transport {
            TransportPolicy::Standard => &self.standard,
            TransportPolicy::LegacyTls => &self.legacy,
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, source: &Source) -> Result<String, FetchError> {
        let client = self.client_for(source);
        let url = source.url.as_str();
        let total_t0 = Instant::now();

        let mut attempt = 0usize;
        loop {
            attempt += 1;
            let outcome = client.get(url).send().await;

            match outcome {
                Ok(resp) if resp.status().is_success() => {
                    let body = resp.text().await.map_err(|e| FetchError::Transport {
                        url: url.to_string(),
                        attempts: attempt,
                        source: e,
                    })?;
                    debug!(
                        source = %source.id,
                        bytes = body.len(),
                        attempt,
                        elapsed_ms = total_t0.elapsed().as_millis() as u64,
                        "fetched"
                    );
                    return Ok(body);
                }
                Ok(resp) => {
                    let status = resp.status();
                    if !is_retryable_status(status) || attempt >= MAX_ATTEMPTS {
                        return Err(FetchError::Status {
                            url: url.to_string(),
                            status,
                            attempts: attempt,
                        });
                    }
                    warn!(source = %source.id, %status, attempt, "retryable status; backing off");
                }
                Err(e) => {
                    if attempt >= MAX_ATTEMPTS {
                        return Err(FetchError::Transport {
                            url: url.to_string(),
                            attempts: attempt,
                            source: e,
                        });
                    }
                    warn!(source = %source.id, error = %e, attempt, "request failed; backing off");
                }
            }

            sleep(backoff_delay(attempt)).await;
        }
    }
}

/// Transient status classes worth a retry.
pub(crate) fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Exponential backoff with jitter: `min(base * 2^(attempt-1), max) + 0..250ms`.
pub(crate) fn backoff_delay(attempt: usize) -> Duration {
    let mut delay = BASE_DELAY.saturating_mul(1 << (attempt - 1).min(16));
    if delay > MAX_DELAY {
        delay = MAX_DELAY;
    }
    let jitter_ms: u64 = rng().random_range(0..=250);
    delay + Duration::from_millis(jitter_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_family_and_429_are_retryable() {
        for code in [429u16, 500, 502, 503, 504] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(is_retryable_status(status), "{code} should be retryable");
        }
    }

    #[test]
    fn client_errors_fail_fast() {
        for code in [400u16, 401, 403, 404, 410] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(!is_retryable_status(status), "{code} should not be retryable");
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let d1 = backoff_delay(1);
        assert!(d1 >= Duration::from_secs(1) && d1 < Duration::from_millis(1251));

        let d2 = backoff_delay(2);
        assert!(d2 >= Duration::from_secs(2) && d2 < Duration::from_millis(2251));

        let d10 = backoff_delay(10);
        assert!(d10 <= MAX_DELAY + Duration::from_millis(250));
    }
}
