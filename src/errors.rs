//! Error taxonomy for the pipeline.
//!
//! Each variant family maps to a containment boundary:
//!
//! - [`FetchError`] and [`ExtractError`] are per-source and never abort a
//!   run; the collector logs them and moves on.
//! - [`PersistenceError`] and [`SummarizerError`] are fatal: they surface to
//!   the orchestrator, which marks the run failed and still runs the
//!   watchdog.
//! - [`NotifierError`] is logged wherever it occurs and never escalates.

use thiserror::Error;

/// Failure fetching one source. Non-fatal; the run continues.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GET {url} failed after {attempts} attempts: {source}")]
    Transport {
        url: String,
        attempts: usize,
        #[source]
        source: reqwest::Error,
    },

    #[error("GET {url} returned {status} after {attempts} attempts")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        attempts: usize,
    },
}

/// Failure parsing a fetched document. Treated as zero candidates.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("malformed feed: {0}")]
    Feed(#[from] quick_xml::DeError),
}

/// Failure reading or writing a persisted store. Fatal for the run.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl PersistenceError {
    pub fn io(action: &'static str, path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Failure from the summarization collaborator. Fatal for the run: only an
/// explicit skip signal from the model is a non-error outcome.
#[derive(Debug, Error)]
pub enum SummarizerError {
    #[error("summarizer not configured: set LLM_API_KEY")]
    NotConfigured,

    #[error("summarizer request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("summarizer returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("summarizer response violated the contract: {0}")]
    Contract(String),
}

/// Failure configuring or delivering an alert. Logged only.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("telegram send failed: {0}")]
    Telegram(#[from] reqwest::Error),

    #[error("bad alert email address: {0}")]
    EmailAddress(#[from] lettre::address::AddressError),

    #[error("email build failed: {0}")]
    EmailBuild(#[from] lettre::error::Error),

    #[error("email transport failed: {0}")]
    EmailTransport(#[from] lettre::transport::smtp::Error),
}

/// Umbrella error consumed by the orchestrator. Anything that becomes a
/// `PipelineError` sets `pipeline_failed = true`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("source registry: {0}")]
    Registry(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Summarizer(#[from] SummarizerError),
}
