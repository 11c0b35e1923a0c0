//! Shape checks that turn extractor output into [`NewsItem`]s.

use crate::errors::ValidationError;
use crate::models::{CandidateItem, NewsItem};
use crate::utils::truncate_for_log;
use chrono::Datelike;
use clap::ValueEnum;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

/// What to do with a batch that contains an invalid item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Drop the invalid item with a warning, keep the rest.
    #[default]
    Skip,
    /// Fail the whole batch on the first invalid item.
    Fail,
}

/// Validate a single candidate.
///
/// Checks, in order: non-empty title, absolute link (scheme and host), date.
/// The date must fall in years 0 through 9999 so it can be written as RFC 2822.
pub fn validate(candidate: CandidateItem) -> Result<NewsItem, ValidationError> {
    let title = candidate.title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }

    let link = Url::parse(candidate.link.trim())
        .ok()
        .filter(Url::has_host)
        .ok_or_else(|| ValidationError::RelativeLink {
            link: candidate.link.clone(),
        })?;

    let date = candidate.date.ok_or_else(|| ValidationError::MissingDate {
        title: title.to_string(),
    })?;
    if !(0..=9999).contains(&date.year()) {
        return Err(ValidationError::DateOutOfRange {
            title: title.to_string(),
            date: date.to_rfc3339(),
        });
    }

    Ok(NewsItem::from_checked(title.to_string(), link, date))
}

/// Validate every candidate of a batch under `policy`.
#[instrument(level = "debug", skip(candidates), fields(count = candidates.len()))]
pub fn validate_batch(
    candidates: Vec<CandidateItem>,
    policy: ValidationPolicy,
) -> Result<Vec<NewsItem>, ValidationError> {
    let total = candidates.len();
    let mut valid = Vec::with_capacity(total);

    for (index, candidate) in candidates.into_iter().enumerate() {
        let preview = truncate_for_log(&candidate.title, 80);
        match validate(candidate) {
            Ok(item) => valid.push(item),
            Err(e) => match policy {
                ValidationPolicy::Skip => {
                    warn!(index, title = %preview, error = %e, "Skipping invalid item");
                }
                ValidationPolicy::Fail => return Err(e),
            },
        }
    }

    debug!(total, valid = valid.len(), "Validated batch");
    Ok(valid)
}
