//! Document extraction, polymorphic over the source's fetch strategy.
//!
//! Each strategy turns one fetched document into a bounded list of
//! [`Candidate`] items (title + body + link):
//!
//! - [`feed`]: RSS syndication feeds
//! - [`page`]: HTML announcement/listing pages
//!
//! Extraction does no length or quality filtering: short or junk
//! candidates are returned as-is and dropped later by the change detector,
//! which owns that rule.

pub mod feed;
pub mod page;

use crate::errors::ExtractError;
use crate::models::{Candidate, FetchStrategy, Source};

/// Upper bound on candidates returned per source.
pub const MAX_CANDIDATES: usize = 5;

/// Extract candidates from a fetched document.
///
/// A malformed feed is an [`ExtractError`]; the caller treats it as zero
/// candidates. The page strategy never errors; an unrecognized layout just
/// yields nothing.
pub fn extract(document: &str, source: &Source) -> Result<Vec<Candidate>, ExtractError> {
    let mut candidates = match source.fetch_strategy {
        FetchStrategy::Feed => feed::extract(document, &source.url)?,
        FetchStrategy::Page => page::extract(document, &source.url),
    };
    candidates.truncate(MAX_CANDIDATES);
    Ok(candidates)
}
