//! Small helpers: slugs, truncation, markup stripping, and log tailing.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::path::Path;

/// Maximum length of a cache-key slug.
const SLUG_MAX: usize = 60;

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Lowercase a title and make it key-safe: spaces and slashes become
/// hyphens, then the result is capped at 60 characters.
///
/// This is the slug used in hash-cache keys and record ids, so its exact
/// behavior is load-bearing: changing it would orphan every existing cache
/// entry and re-announce old items.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .replace([' ', '/'], "-")
        .chars()
        .take(SLUG_MAX)
        .collect()
}

/// Truncate a string to at most `max` characters, on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Truncate a string for logging, appending how much was cut.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max).collect();
        format!("{}…(+{} chars)", kept, s.chars().count() - max)
    }
}

/// Strip HTML markup from a fragment, returning collapsed plain text.
///
/// Feed descriptions routinely embed `<p>`/`<a>`/entity soup; the detector
/// must hash the visible text only, or cosmetic markup changes would count
/// as new content.
pub fn strip_markup(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    RE_WS.replace_all(text.trim(), " ").to_string()
}

/// Read the last `n` lines of the run log for alert context.
///
/// Missing or unreadable log files degrade to a placeholder rather than an
/// error: alerting must not fail because logging did.
pub fn log_tail(path: &Path, n: usize) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let lines: Vec<&str> = content.lines().collect();
            let start = lines.len().saturating_sub(n);
            lines[start..].join("\n")
        }
        Err(_) => "(no log file found)".to_string(),
    }
}
