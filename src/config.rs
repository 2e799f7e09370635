//! Runtime configuration, assembled once at startup.
//!
//! Everything env- or flag-driven is folded into a single [`AppConfig`]
//! constructed in `main` and passed by reference into each component. No
//! component reads the environment on its own.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Cli;

/// Summarization endpoint settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

/// Telegram alert channel settings. Present only when fully configured.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

/// SMTP alert channel settings. Present only when fully configured.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub user: String,
    pub pass: String,
    pub to: String,
}

/// The pipeline's full runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub sources_path: PathBuf,
    pub frontend_path: PathBuf,
    pub log_path: PathBuf,
    /// Delay inserted between sources during collection.
    pub pacing: Duration,
    pub dry_run: bool,
    /// None when no API key is configured; the orchestrator treats a
    /// missing key with pending records as a pipeline failure.
    pub llm: Option<LlmConfig>,
    pub telegram: Option<TelegramConfig>,
    pub smtp: Option<SmtpConfig>,
}

impl AppConfig {
    /// Build the configuration from parsed CLI arguments (which already
    /// folded in the environment via clap's `env` attributes).
    pub fn from_cli(cli: &Cli) -> Self {
        let telegram = match (&cli.telegram_bot_token, &cli.telegram_chat_id) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig {
                bot_token: bot_token.clone(),
                chat_id: chat_id.clone(),
            }),
            _ => None,
        };

        let smtp = match (&cli.smtp_host, &cli.smtp_user, &cli.smtp_pass, &cli.alert_email) {
            (Some(host), Some(user), Some(pass), Some(to)) => Some(SmtpConfig {
                host: host.clone(),
                user: user.clone(),
                pass: pass.clone(),
                to: to.clone(),
            }),
            _ => None,
        };

        let llm = cli.llm_api_key.as_ref().map(|key| LlmConfig {
            base_url: cli.llm_base_url.trim_end_matches('/').to_string(),
            model: cli.llm_model.clone(),
            api_key: key.clone(),
        });

        Self {
            data_dir: PathBuf::from(&cli.data_dir),
            sources_path: PathBuf::from(&cli.sources),
            frontend_path: PathBuf::from(&cli.frontend),
            log_path: PathBuf::from(&cli.log_file),
            pacing: Duration::from_secs(1),
            dry_run: cli.dry_run,
            llm,
            telegram,
            smtp,
        }
    }

    /// Records replaced wholesale each run; input to the summarizer.
    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join("raw_content.json")
    }

    /// Persistent content-hash cache.
    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join("content_hashes.json")
    }

    /// Summaries replaced wholesale each run; probed by the watchdog.
    pub fn summaries_path(&self) -> PathBuf {
        self.data_dir.join("summaries.json")
    }
}

/// Test helper: a config rooted at `dir` with zero pacing and no
/// collaborator credentials.
pub fn test_config(dir: &Path) -> AppConfig {
    AppConfig {
        data_dir: dir.join("data"),
        sources_path: dir.join("sources.yaml"),
        frontend_path: dir.join("index.html"),
        log_path: dir.join("pipeline.log"),
        pacing: Duration::ZERO,
        dry_run: false,
        llm: None,
        telegram: None,
        smtp: None,
    }
}
