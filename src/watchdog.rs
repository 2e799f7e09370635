//! Post-run health evaluation and alerting.
//!
//! The watchdog runs at the end of every pipeline invocation, on every
//! path, and answers one question: did this deployment produce a healthy,
//! fresh output? Checks are independent: all of them run even after the
//! first failure, and each issue found raises its own alert carrying the
//! tail of the run log for diagnosis.
//!
//! The verdict is logged and returned but never changes the process exit
//! code; that reflects pipeline failure alone.

use std::path::Path;
use std::time::SystemTime;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::models::Summary;
use crate::notify::NotifierSet;
use crate::utils::log_tail;

/// Maximum acceptable age of the published artifact.
pub const STALE_AFTER_HOURS: f64 = 28.0;

/// Lines of run log attached to each alert.
const LOG_TAIL_LINES: usize = 15;

/// State of the summaries store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    Missing,
    Unreadable,
    Empty,
    Populated,
}

/// Filesystem facts the issue evaluation runs over. Separated from I/O so
/// the rules are testable without staging real artifacts.
#[derive(Debug)]
pub struct ArtifactProbe {
    pub pipeline_failed: bool,
    pub summaries: StoreStatus,
    /// Age of the published artifact in hours; `None` when it is absent.
    pub artifact_age_hours: Option<f64>,
}

/// Evaluate all issue conditions. Never short-circuits: a failed pipeline
/// does not hide a stale artifact.
pub fn issues(probe: &ArtifactProbe) -> Vec<String> {
    let mut found = Vec::new();

    if probe.pipeline_failed {
        found.push("Pipeline exited with an error".to_string());
    }

    match probe.summaries {
        StoreStatus::Missing => found.push("summaries.json does not exist".to_string()),
        StoreStatus::Unreadable => found.push("summaries.json could not be parsed".to_string()),
        StoreStatus::Empty => {
            found.push("summaries.json is empty; no items published this run".to_string())
        }
        StoreStatus::Populated => {}
    }

    match probe.artifact_age_hours {
        None => found.push("index.html does not exist".to_string()),
        Some(age) if age > STALE_AFTER_HOURS => found.push(format!(
            "index.html not updated in {age:.0} hours (max {STALE_AFTER_HOURS:.0}h)"
        )),
        Some(_) => {}
    }

    found
}

/// Probe the artifacts, evaluate, and alert. Returns `true` when healthy.
pub async fn evaluate(config: &AppConfig, pipeline_failed: bool, notifiers: &NotifierSet) -> bool {
    let probe = ArtifactProbe {
        pipeline_failed,
        summaries: probe_summaries(&config.summaries_path()).await,
        artifact_age_hours: probe_age_hours(&config.frontend_path),
    };

    let found = issues(&probe);
    if found.is_empty() {
        info!("watchdog: all checks passed");
        return true;
    }

    let tail = log_tail(&config.log_path, LOG_TAIL_LINES);
    for issue in &found {
        warn!(issue = %issue, "watchdog issue");
        let message = format!(
            "⚠️ *Pipeline Alert*\n\n*Reason:* {issue}\n\n*Last log lines:*\n```\n{tail}\n```"
        );
        notifiers.notify_all(&message).await;
    }

    false
}

async fn probe_summaries(path: &Path) -> StoreStatus {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => match serde_json::from_str::<Vec<Summary>>(&raw) {
            Ok(summaries) if summaries.is_empty() => StoreStatus::Empty,
            Ok(_) => StoreStatus::Populated,
            Err(_) => StoreStatus::Unreadable,
        },
        Err(_) => StoreStatus::Missing,
    }
}

fn probe_age_hours(path: &Path) -> Option<f64> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    let age = SystemTime::now().duration_since(modified).unwrap_or_default();
    Some(age.as_secs_f64() / 3600.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy_probe() -> ArtifactProbe {
        ArtifactProbe {
            pipeline_failed: false,
            summaries: StoreStatus::Populated,
            artifact_age_hours: Some(2.0),
        }
    }

    #[test]
    fn healthy_probe_has_no_issues() {
        assert!(issues(&healthy_probe()).is_empty());
    }

    #[test]
    fn pipeline_failure_is_an_issue_regardless_of_artifacts() {
        let probe = ArtifactProbe {
            pipeline_failed: true,
            ..healthy_probe()
        };
        let found = issues(&probe);
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("exited with an error"));
    }

    #[test]
    fn missing_and_empty_stores_are_distinct_issues() {
        let missing = ArtifactProbe {
            summaries: StoreStatus::Missing,
            ..healthy_probe()
        };
        assert!(issues(&missing)[0].contains("does not exist"));

        let empty = ArtifactProbe {
            summaries: StoreStatus::Empty,
            ..healthy_probe()
        };
        assert!(issues(&empty)[0].contains("is empty"));
    }

    #[test]
    fn artifact_aged_past_threshold_is_stale() {
        let probe = ArtifactProbe {
            artifact_age_hours: Some(30.0),
            ..healthy_probe()
        };
        let found = issues(&probe);
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("30 hours"));

        let fresh = ArtifactProbe {
            artifact_age_hours: Some(27.9),
            ..healthy_probe()
        };
        assert!(issues(&fresh).is_empty());
    }

    #[test]
    fn checks_do_not_short_circuit() {
        let probe = ArtifactProbe {
            pipeline_failed: true,
            summaries: StoreStatus::Missing,
            artifact_age_hours: None,
        };
        assert_eq!(issues(&probe).len(), 3);
    }
}
