//! Publisher collaborator: injects summary cards into the static HTML
//! surface and raises alerts for urgent items.
//!
//! The card block lives between two marker comments in `index.html`; an
//! existing block is replaced wholesale, so repeated runs never accumulate
//! cards. The artifact is rewritten via temp-file + rename, so it is either
//! the old page or the new page, never half of each.
//!
//! After injection, every RED-badged summary produces one alert through
//! the notifier set, followed by a digest of the published batch.

use std::fmt::Write as _;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{Datelike, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::errors::PersistenceError;
use crate::models::{Badge, Summary};
use crate::notify::NotifierSet;

/// Display surface holds at most this many cards.
const MAX_CARDS: usize = 5;

const CARDS_START: &str = "<!-- AUTO-GENERATED CARDS START -->";
const CARDS_END: &str = "<!-- AUTO-GENERATED CARDS END -->";
const SKELETON_MARKER: &str = "<!-- Skeleton: next update loading -->";

static RE_CARDS_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!-- AUTO-GENERATED CARDS START -->.*?<!-- AUTO-GENERATED CARDS END -->")
        .unwrap()
});
static RE_DATE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<strong>This Week</strong> &middot; [^<]+").unwrap());

/// Seam between the orchestrator and the display surface.
#[async_trait]
pub trait Publish: Send + Sync {
    async fn publish(
        &self,
        summaries: &[Summary],
        notifiers: &NotifierSet,
    ) -> Result<(), PersistenceError>;
}

/// Production publisher writing to a static `index.html`.
pub struct HtmlPublisher {
    frontend_path: PathBuf,
}

impl HtmlPublisher {
    pub fn new(frontend_path: PathBuf) -> Self {
        Self { frontend_path }
    }
}

#[async_trait]
impl Publish for HtmlPublisher {
    async fn publish(
        &self,
        summaries: &[Summary],
        notifiers: &NotifierSet,
    ) -> Result<(), PersistenceError> {
        if summaries.is_empty() {
            info!("no summaries to publish");
            return Ok(());
        }

        let shown = &summaries[..summaries.len().min(MAX_CARDS)];

        match tokio::fs::read_to_string(&self.frontend_path).await {
            Ok(html) => {
                let updated = inject_cards(&html, shown);
                let tmp = self.frontend_path.with_extension("html.tmp");
                tokio::fs::write(&tmp, updated).await.map_err(|e| {
                    PersistenceError::io("write", tmp.display().to_string(), e)
                })?;
                tokio::fs::rename(&tmp, &self.frontend_path)
                    .await
                    .map_err(|e| {
                        PersistenceError::io(
                            "rename",
                            self.frontend_path.display().to_string(),
                            e,
                        )
                    })?;
                info!(cards = shown.len(), path = %self.frontend_path.display(), "injected cards");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Nothing to inject into; the watchdog will flag the
                // missing artifact. Alerts below still go out.
                warn!(path = %self.frontend_path.display(), "frontend artifact not found; skipping injection");
            }
            Err(e) => {
                return Err(PersistenceError::io(
                    "read",
                    self.frontend_path.display().to_string(),
                    e,
                ));
            }
        }

        let red: Vec<&Summary> = summaries.iter().filter(|s| s.badge == Badge::Red).collect();
        for summary in &red {
            notifiers.notify_all(&format_red_alert(summary)).await;
        }
        notifiers.notify_all(&format_digest(shown)).await;

        info!(published = shown.len(), red_alerts = red.len(), "publisher done");
        Ok(())
    }
}

/// Replace (or insert) the card block and refresh the displayed date.
fn inject_cards(html: &str, summaries: &[Summary]) -> String {
    let cards: Vec<String> = summaries.iter().enumerate().map(|(i, s)| build_card(s, i)).collect();
    let block = format!("{}\n{}\n{}", CARDS_START, cards.join("\n"), CARDS_END);

    let mut out = if RE_CARDS_BLOCK.is_match(html) {
        // NoExpand: summary text may legitimately contain `$`.
        RE_CARDS_BLOCK
            .replace(html, regex::NoExpand(block.as_str()))
            .into_owned()
    } else if html.contains(SKELETON_MARKER) {
        html.replace(SKELETON_MARKER, &format!("{block}\n      {SKELETON_MARKER}"))
    } else {
        // No anchor point at all; append so the content is not lost.
        format!("{html}\n{block}\n")
    };

    let today = Local::now();
    let date_line = format!(
        "<strong>This Week</strong> &middot; {} {}",
        today.day(),
        today.format("%b %Y")
    );
    out = RE_DATE_LINE.replace(&out, date_line.as_str()).into_owned();
    out
}

fn build_card(summary: &Summary, index: usize) -> String {
    let mut bullets = String::new();
    for bullet in &summary.bullets {
        writeln!(bullets, "          <div class=\"key-point\">{bullet}</div>").unwrap();
    }
    let delay_style = if index > 0 {
        format!(" style=\"animation-delay:{:.2}s\"", index as f64 * 0.08)
    } else {
        String::new()
    };

    format!(
        r#"      <!-- Auto-generated card: {id} -->
      <div class="update-card"{delay_style}>
        <div class="card-header">
          <div class="card-badge {badge_class}">&#9679; {badge_label}</div>
          <div class="card-date">{date}</div>
        </div>
        <h3 class="card-title">{title}</h3>
        <p class="card-summary">{so_what}</p>
        <div class="card-key-points">
          <h4>Key Points</h4>
{bullets}        </div>
        <div class="card-footer">
          <div class="card-source">Source: <a href="{url}" target="_blank" rel="noopener">{source}</a></div>
          <a href="{url}" class="card-cta" target="_blank" rel="noopener">Read source &#8594;</a>
        </div>
      </div>"#,
        id = summary.id,
        delay_style = delay_style,
        badge_class = summary.badge.css_class(),
        badge_label = summary.badge.label(),
        date = summary.date,
        title = summary.title,
        so_what = summary.so_what,
        bullets = bullets,
        url = summary.source_url,
        source = summary.source_name,
    )
}

fn format_red_alert(summary: &Summary) -> String {
    let bullets: String = summary
        .bullets
        .iter()
        .map(|b| format!("  • {b}\n"))
        .collect();
    format!(
        "🔴 *Pipeline ALERT*\n\n*{}*\n\n{}\n\n{}\n📎 [Read source]({})\n_Source: {}_",
        summary.title, summary.so_what, bullets, summary.source_url, summary.source_name
    )
}

fn format_digest(summaries: &[Summary]) -> String {
    let mut lines = vec!["📋 *This Week's Signals*\n".to_string()];
    for summary in summaries {
        let emoji = match summary.badge {
            Badge::Green => "🟢",
            Badge::Orange => "🟠",
            Badge::Blue => "🔵",
            Badge::Red => "🔴",
        };
        lines.push(format!(
            "{} *{}*\n_{}_\n[Source]({})\n",
            emoji, summary.title, summary.so_what, summary.source_url
        ));
    }
    lines.join("\n")
}
