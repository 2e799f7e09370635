//! The pipeline orchestrator.
//!
//! One invocation walks a fixed state machine:
//!
//! ```text
//! Start → Collecting → (Summarizing → Publishing) → WatchdogCheck → End
//! ```
//!
//! Collecting always executes. Zero new records skips straight from
//! Collecting to WatchdogCheck; any fatal error on the way sets
//! `pipeline_failed` and does the same. The watchdog is the one step that
//! runs on every path (including dry runs) so a silently broken
//! deployment cannot go unnoticed.
//!
//! The process exit status reflects `pipeline_failed` alone. The
//! watchdog's health verdict is logged and reported but never changes the
//! exit code.

use tracing::{error, info};

use crate::collect;
use crate::config::AppConfig;
use crate::errors::PipelineError;
use crate::fetch::Fetch;
use crate::notify::NotifierSet;
use crate::publish::Publish;
use crate::registry;
use crate::store;
use crate::summarize::{Summarize, SummaryOutcome};
use crate::watchdog;

/// What one invocation produced, for logging and the exit code.
#[derive(Debug)]
pub struct PipelineReport {
    pub pipeline_failed: bool,
    /// The watchdog's verdict. Informational only.
    pub healthy: bool,
    pub new_records: usize,
    pub published: usize,
}

impl PipelineReport {
    pub fn exit_code(&self) -> u8 {
        if self.pipeline_failed { 1 } else { 0 }
    }
}

/// Run the full pipeline once.
pub async fn run(
    config: &AppConfig,
    fetcher: &dyn Fetch,
    summarizer: &dyn Summarize,
    publisher: &dyn Publish,
    notifiers: &NotifierSet,
) -> PipelineReport {
    info!(dry_run = config.dry_run, "pipeline starting");

    let mut new_records = 0usize;
    let mut published = 0usize;

    let outcome: Result<(), PipelineError> = async {
        info!("step 1/3: collector");
        let sources = registry::load(&config.sources_path)?;
        let records = collect::collect(config, &sources, fetcher).await?;
        new_records = records.len();
        info!(new = new_records, "collector finished");

        if config.dry_run {
            info!("dry run; stopping after collection");
            return Ok(());
        }
        if records.is_empty() {
            info!("no new records; skipping summarizer and publisher");
            return Ok(());
        }

        info!("step 2/3: summarizer");
        let mut summaries = Vec::new();
        for record in &records {
            match summarizer.summarize(record).await? {
                SummaryOutcome::Summary(summary) => summaries.push(summary),
                SummaryOutcome::Skip => {}
            }
        }
        store::write_summaries(&config.summaries_path(), &summaries).await?;
        info!(summaries = summaries.len(), "summarizer finished");

        info!("step 3/3: publisher");
        publisher.publish(&summaries, notifiers).await?;
        published = summaries.len();

        Ok(())
    }
    .await;

    let pipeline_failed = match outcome {
        Ok(()) => false,
        Err(e) => {
            error!(error = %e, "pipeline FAILED");
            true
        }
    };

    // WatchdogCheck: never skippable, regardless of the path taken above.
    info!("watchdog: health check");
    let healthy = watchdog::evaluate(config, pipeline_failed, notifiers).await;
    info!(healthy, pipeline_failed, "pipeline run complete");

    PipelineReport {
        pipeline_failed,
        healthy,
        new_records,
        published,
    }
}
