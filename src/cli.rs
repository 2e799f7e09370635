//! Command-line interface definitions.
//!
//! All options can be provided as flags or environment variables; secrets
//! (Telegram, SMTP, LLM credentials) are env-only in practice and usually
//! arrive via a `.env` file loaded at startup.

use clap::Parser;

/// Command-line arguments for the announcement pipeline.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding the persisted stores (records, hash cache, summaries)
    #[arg(short, long, default_value = "data")]
    pub data_dir: String,

    /// Path to the source registry file
    #[arg(short, long, default_value = "sources.yaml")]
    pub sources: String,

    /// Path to the published HTML artifact
    #[arg(short, long, default_value = "frontend/index.html")]
    pub frontend: String,

    /// Path to the run log (also read back for alert context)
    #[arg(long, default_value = "logs/pipeline.log")]
    pub log_file: String,

    /// Collect only: skip summarization, publishing, and the watchdog
    #[arg(long)]
    pub dry_run: bool,

    /// Base URL of the OpenAI-compatible summarization endpoint
    #[arg(long, env = "LLM_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub llm_base_url: String,

    /// Model name passed to the summarization endpoint
    #[arg(long, env = "LLM_MODEL", default_value = "gpt-4o-mini")]
    pub llm_model: String,

    /// API key for the summarization endpoint
    #[arg(long, env = "LLM_API_KEY")]
    pub llm_api_key: Option<String>,

    /// Telegram bot token for alerts
    #[arg(long, env = "TELEGRAM_BOT_TOKEN")]
    pub telegram_bot_token: Option<String>,

    /// Telegram chat id alerts are sent to
    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    pub telegram_chat_id: Option<String>,

    /// SMTP relay host for email alerts
    #[arg(long, env = "SMTP_HOST")]
    pub smtp_host: Option<String>,

    /// SMTP username
    #[arg(long, env = "SMTP_USER")]
    pub smtp_user: Option<String>,

    /// SMTP password
    #[arg(long, env = "SMTP_PASS")]
    pub smtp_pass: Option<String>,

    /// Address alert emails are delivered to
    #[arg(long, env = "ALERT_EMAIL")]
    pub alert_email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let cli = Cli::parse_from(["announce_watch"]);
        assert_eq!(cli.data_dir, "data");
        assert_eq!(cli.sources, "sources.yaml");
        assert_eq!(cli.frontend, "frontend/index.html");
        assert!(!cli.dry_run);
    }

    #[test]
    fn dry_run_and_paths_parse() {
        let cli = Cli::parse_from([
            "announce_watch",
            "--dry-run",
            "-d",
            "/tmp/aw-data",
            "-s",
            "/tmp/sources.yaml",
        ]);
        assert!(cli.dry_run);
        assert_eq!(cli.data_dir, "/tmp/aw-data");
        assert_eq!(cli.sources, "/tmp/sources.yaml");
    }
}
