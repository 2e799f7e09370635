//! Watchdog evaluation against real artifact state on disk.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use announce_watch::config::test_config;
use announce_watch::errors::NotifierError;
use announce_watch::notify::{Notifier, NotifierSet};
use announce_watch::watchdog;

struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }
    async fn notify(&self, message: &str) -> Result<(), NotifierError> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

fn setup(tag: &str) -> (std::path::PathBuf, Arc<Mutex<Vec<String>>>, NotifierSet) {
    let dir = std::env::temp_dir().join(format!("aw-watchdog-{tag}-{}", std::process::id()));
    std::fs::remove_dir_all(&dir).ok();
    std::fs::create_dir_all(&dir).unwrap();
    let messages = Arc::new(Mutex::new(Vec::new()));
    let notifiers = NotifierSet::from_notifiers(vec![Box::new(RecordingNotifier {
        messages: messages.clone(),
    })]);
    (dir, messages, notifiers)
}

/// A failed pipeline is unhealthy and alerts no matter what the artifacts
/// look like, and each issue raises its own alert.
#[tokio::test]
async fn failed_pipeline_always_alerts() {
    let (dir, messages, notifiers) = setup("failed");
    let config = test_config(&dir);

    let healthy = watchdog::evaluate(&config, true, &notifiers).await;
    assert!(!healthy);

    let sent = messages.lock().unwrap();
    // Failure + missing summaries + missing artifact: one alert each.
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().any(|m| m.contains("Pipeline exited with an error")));
    assert!(sent.iter().any(|m| m.contains("summaries.json does not exist")));
    assert!(sent.iter().any(|m| m.contains("index.html does not exist")));
    drop(sent);

    std::fs::remove_dir_all(&dir).ok();
}

/// Alerts carry the tail of the run log for diagnosis.
#[tokio::test]
async fn alerts_include_log_tail() {
    let (dir, messages, notifiers) = setup("tail");
    let config = test_config(&dir);

    let log_body: String = (1..=40).map(|i| format!("log line {i}\n")).collect();
    std::fs::write(&config.log_path, log_body).unwrap();

    watchdog::evaluate(&config, true, &notifiers).await;

    let sent = messages.lock().unwrap();
    let first = &sent[0];
    assert!(first.contains("log line 40"));
    // Only the last 15 lines are attached.
    assert!(!first.contains("log line 25\n"));
    assert!(first.contains("log line 26"));
    drop(sent);

    std::fs::remove_dir_all(&dir).ok();
}

/// Fresh, populated artifacts with a clean run: healthy, no alerts.
#[tokio::test]
async fn healthy_run_sends_nothing() {
    let (dir, messages, notifiers) = setup("healthy");
    let config = test_config(&dir);
    std::fs::create_dir_all(config.summaries_path().parent().unwrap()).unwrap();
    std::fs::write(
        config.summaries_path(),
        r#"[{"id":"x","source_id":"rbi","source_name":"RBI","source_url":"https://r","domain":"banking","tier":1,"date":"2025-07-01","badge":"GREEN","title":"t","so_what":"s","bullets":[]}]"#,
    )
    .unwrap();
    std::fs::write(&config.frontend_path, "<html></html>").unwrap();

    let healthy = watchdog::evaluate(&config, false, &notifiers).await;
    assert!(healthy);
    assert!(messages.lock().unwrap().is_empty());

    std::fs::remove_dir_all(&dir).ok();
}
