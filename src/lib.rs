//! # announce_watch
//!
//! A change-detection pipeline for government and news announcements. One
//! invocation fetches every active source from a whitelisted registry,
//! extracts candidate items, drops everything already seen via a
//! persistent content-hash cache, hands the new items to an LLM-backed
//! summarizer, republishes the results into a static HTML surface, and
//! finishes with a watchdog health check that alerts over Telegram/email
//! on failure or staleness.
//!
//! ## Architecture
//!
//! The run is strictly sequential:
//! 1. **Registry**: load the source whitelist, resolve transport policies
//! 2. **Collect**: fetch → extract → classify per source, capped at 5 new
//!    items per run, persisted atomically with the merged hash cache
//! 3. **Summarize**: one LLM call per new record (external collaborator)
//! 4. **Publish**: inject cards into `index.html`, alert on RED items
//! 5. **Watchdog**: health-check the artifacts and alert on every issue
//!
//! Steps 3 and 4 are skipped when nothing new was found; step 5 runs on
//! every path. The process exits non-zero only on pipeline failure.
//!
//! Overlapping invocations are not defended against: the store files
//! assume a single scheduled run at a time, so concurrent use needs an
//! external run lock.

pub mod cli;
pub mod collect;
pub mod config;
pub mod detect;
pub mod errors;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod publish;
pub mod registry;
pub mod store;
pub mod summarize;
pub mod utils;
pub mod watchdog;
