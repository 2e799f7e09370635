//! Summarization collaborator: an OpenAI-compatible chat endpoint behind a
//! retry decorator.
//!
//! The model is asked for a strict JSON payload (headline, "so what"
//! sentence, three bullets, badge) and may answer with an explicit skip
//! signal when the source text cannot be summarized accurately. Anything
//! else that goes wrong (transport, status, malformed payload) is a
//! [`SummarizerError`] and fails the pipeline; there is no silent skip.
//!
//! # Retry Strategy
//!
//! - Up to 5 attempts
//! - Exponential backoff starting at 1 second, capped at 30 seconds
//! - Random jitter (0–250ms) to avoid thundering herd

use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::{Rng, rng};
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::LlmConfig;
use crate::errors::SummarizerError;
use crate::models::{Badge, FetchedRecord, Summary};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str = r#"You are a compliance guide for Indian expats living abroad.
Summarize one government or news update into clear, actionable intelligence.

Rules:
1. Write EXACTLY 3 bullet points. Each bullet is one actionable sentence.
2. Start each bullet with a strong verb: Review, Convert, File, Check, Declare, Ensure, Confirm.
3. Do NOT add information that is not present in the source text.
4. Do NOT give legal or financial advice; only state what the rule or circular says.
5. Write one clear "so_what" sentence (max 25 words) on why this matters.
6. Suggest a badge: GREEN (official update), ORANGE (expert/advisory), BLUE (community), RED (urgent action required).
7. If you cannot summarize accurately from the text provided, respond with exactly: {"skip": true}

Respond ONLY with valid JSON in this format:
{
  "title": "Short punchy headline (max 12 words)",
  "so_what": "One sentence on why this matters.",
  "bullets": ["Bullet 1.", "Bullet 2.", "Bullet 3."],
  "badge": "GREEN",
  "skip": false
}"#;

/// Non-error outcomes of summarizing one record.
#[derive(Debug)]
pub enum SummaryOutcome {
    Summary(Summary),
    /// The model's explicit can't-summarize signal; the record is dropped
    /// without failing the run.
    Skip,
}

/// Seam between the orchestrator and the LLM backend.
#[async_trait]
pub trait Summarize: Send + Sync {
    async fn summarize(&self, record: &FetchedRecord) -> Result<SummaryOutcome, SummarizerError>;
}

/// Decorator adding exponential-backoff retries to any [`Summarize`]
/// implementation.
pub struct RetrySummarizer<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
}

impl<T: Summarize> RetrySummarizer<T> {
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
        }
    }
}

#[async_trait]
impl<T: Summarize> Summarize for RetrySummarizer<T> {
    async fn summarize(&self, record: &FetchedRecord) -> Result<SummaryOutcome, SummarizerError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.summarize(record).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        error!(
                            record = %record.id,
                            attempt,
                            max = self.max_retries,
                            elapsed_ms = total_t0.elapsed().as_millis() as u64,
                            error = %e,
                            "summarize exhausted retries"
                        );
                        return Err(e);
                    }

                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1).min(16));
                    if delay > MAX_RETRY_DELAY {
                        delay = MAX_RETRY_DELAY;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + Duration::from_millis(jitter_ms);

                    warn!(record = %record.id, attempt, ?delay, error = %e, "summarize failed; backing off");
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Placeholder used when no API key is configured. Collecting still works;
/// the run fails only if there are records that would need summarizing.
pub struct UnconfiguredSummarizer;

#[async_trait]
impl Summarize for UnconfiguredSummarizer {
    async fn summarize(&self, _record: &FetchedRecord) -> Result<SummaryOutcome, SummarizerError> {
        Err(SummarizerError::NotConfigured)
    }
}

/// Production summarizer for an OpenAI-compatible `/chat/completions`
/// endpoint.
pub struct OpenAiSummarizer {
    client: reqwest::Client,
    config: LlmConfig,
}

impl OpenAiSummarizer {
    pub fn new(config: LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("reqwest client");
        Self { client, config }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// The model's JSON payload. Every field except `skip` is optional; gaps
/// are filled from the record during the merge.
#[derive(Debug, Deserialize)]
struct SummaryPayload {
    #[serde(default)]
    skip: bool,
    title: Option<String>,
    so_what: Option<String>,
    #[serde(default)]
    bullets: Vec<String>,
    badge: Option<Badge>,
}

#[async_trait]
impl Summarize for OpenAiSummarizer {
    async fn summarize(&self, record: &FetchedRecord) -> Result<SummaryOutcome, SummarizerError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": format!(
                    "Source URL: {}\n\nContent:\n{}", record.source_url, record.raw_text
                )},
            ],
            "temperature": 0.1,
            "response_format": {"type": "json_object"},
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SummarizerError::Status {
                status,
                body: crate::utils::truncate_for_log(&body, 300),
            });
        }

        let chat: ChatResponse = resp.json().await?;
        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| SummarizerError::Contract("response had no choices".into()))?;

        let payload = parse_payload(content)?;
        if payload.skip {
            info!(record = %record.id, "skipped by summarizer");
            return Ok(SummaryOutcome::Skip);
        }

        Ok(SummaryOutcome::Summary(merge(record, payload)))
    }
}

/// Parse the model's message content as a [`SummaryPayload`].
fn parse_payload(content: &str) -> Result<SummaryPayload, SummarizerError> {
    serde_json::from_str(content.trim()).map_err(|e| {
        SummarizerError::Contract(format!(
            "invalid payload JSON: {e}; content: {}",
            crate::utils::truncate_for_log(content, 300)
        ))
    })
}

/// Merge the model payload with the record's source metadata, falling back
/// to record fields where the payload left gaps.
fn merge(record: &FetchedRecord, payload: SummaryPayload) -> Summary {
    Summary {
        id: record.id.clone(),
        source_id: record.source_id.clone(),
        source_name: record.source_name.clone(),
        source_url: record.source_url.clone(),
        domain: record.domain.clone(),
        tier: record.tier,
        date: record.date_found.clone(),
        badge: payload.badge.unwrap_or(record.badge),
        title: payload.title.unwrap_or_else(|| record.title.clone()),
        so_what: payload.so_what.unwrap_or_default(),
        bullets: payload.bullets,
    }
}
