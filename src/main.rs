use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

use announce_watch::cli::Cli;
use announce_watch::config::AppConfig;
use announce_watch::fetch::HttpFetcher;
use announce_watch::notify::NotifierSet;
use announce_watch::pipeline;
use announce_watch::publish::HtmlPublisher;
use announce_watch::summarize::{
    OpenAiSummarizer, RetrySummarizer, Summarize, UnconfiguredSummarizer,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Secrets usually arrive via .env on the deployment host.
    dotenvy::dotenv().ok();

    let args = Cli::parse();
    let config = AppConfig::from_cli(&args);

    // --- Tracing init: stdout plus the run log the watchdog tails ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path);

    match log_file {
        Ok(file) => {
            tfmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
                .with_writer(std::io::stdout.and(Arc::new(file)))
                .init();
        }
        Err(e) => {
            tfmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
                .init();
            error!(path = %config.log_path.display(), error = %e, "run log unavailable; alerts will lack log context");
        }
    }

    info!(version = env!("CARGO_PKG_VERSION"), "announce_watch starting");

    let fetcher = HttpFetcher::new();
    let summarizer: Box<dyn Summarize> = match config.llm.clone() {
        Some(llm) => Box::new(RetrySummarizer::new(
            OpenAiSummarizer::new(llm),
            5,
            Duration::from_secs(1),
        )),
        None => Box::new(UnconfiguredSummarizer),
    };
    let publisher = HtmlPublisher::new(config.frontend_path.clone());
    let notifiers = NotifierSet::from_config(&config);

    let report = pipeline::run(&config, &fetcher, summarizer.as_ref(), &publisher, &notifiers).await;

    info!(
        new_records = report.new_records,
        published = report.published,
        healthy = report.healthy,
        failed = report.pipeline_failed,
        "done"
    );
    ExitCode::from(report.exit_code())
}
