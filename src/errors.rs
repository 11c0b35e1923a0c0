//! Error types for the scrape → validate → feed pipeline.
//!
//! Each stage has its own error so callers can decide how far a failure
//! travels: a [`ValidationError`] concerns one item, a [`FetchError`] or
//! [`ExtractionError`] concerns one source, and everything else ends the run.
//! [`FeedError`] is the umbrella type returned by scraper and aggregator
//! operations.

use std::path::PathBuf;

/// The network call for a source did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection, TLS, timeout or body-decoding failure.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// The fetched page did not have the structure the extractor expects.
#[derive(Debug, thiserror::Error)]
#[error("{extractor} could not extract items from {url}: {reason}")]
pub struct ExtractionError {
    pub extractor: String,
    pub url: String,
    pub reason: String,
}

impl ExtractionError {
    pub fn new(extractor: impl Into<String>, url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            extractor: extractor.into(),
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// A candidate item failed one of the shape checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("title is empty")]
    EmptyTitle,

    #[error("link {link:?} is not an absolute URL")]
    RelativeLink { link: String },

    #[error("item {title:?} has no parseable date")]
    MissingDate { title: String },

    /// RSS dates need a four-digit, non-negative year.
    #[error("item {title:?} has date {date} outside years 0000-9999")]
    DateOutOfRange { title: String, date: String },
}

/// Top-level error for scraper, aggregator and feed operations.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Filesystem error while writing the output artifact.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// XML writer/reader failure.
    #[error("XML error: {0}")]
    Xml(String),

    /// A feed document could not be read back. Only the round-trip reader
    /// raises it.
    #[cfg_attr(not(test), allow(dead_code))]
    #[error("malformed feed: {0}")]
    Feed(String),

    #[error("config error: {0}")]
    Config(String),
}

impl FeedError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for failures that belong to a single source and can be isolated
    /// by the aggregator.
    pub fn is_source_failure(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Extraction(_))
    }
}
