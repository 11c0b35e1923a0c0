//! Multi-source aggregation: run several scrapers and merge their items into
//! one globally ordered feed.
//!
//! Sources are fetched concurrently (a few at a time), but results are
//! consumed in source order and then stable-sorted by date, so the merged list
//! does not depend on which fetch finished first.

use crate::errors::FeedError;
use crate::models::{FeedDocument, FeedMetadata, NewsItem, sort_newest_first};
use crate::outputs::rss;
use crate::scrapers::SiteScraper;
use clap::ValueEnum;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use std::path::Path;
use tracing::{error, info, instrument, warn};

pub const DEFAULT_CONCURRENCY: usize = 4;

/// What to do when one source cannot be fetched or extracted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceFailurePolicy {
    /// Log the failure and publish the remaining sources.
    #[default]
    Skip,
    /// Abort the whole run.
    Abort,
}

/// Combines several [`SiteScraper`]s into one feed.
pub struct Aggregator {
    scrapers: Vec<SiteScraper>,
    title: String,
    description: String,
    link: Option<String>,
    self_url: Option<String>,
    on_failure: SourceFailurePolicy,
    concurrency: usize,
}

impl Aggregator {
    pub fn new(scrapers: Vec<SiteScraper>, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            scrapers,
            title: title.into(),
            description: description.into(),
            link: None,
            self_url: None,
            on_failure: SourceFailurePolicy::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Channel link; defaults to the first scraper's source URL.
    pub fn with_link(mut self, link: Option<String>) -> Self {
        self.link = link;
        self
    }

    pub fn with_self_url(mut self, self_url: Option<String>) -> Self {
        self.self_url = self_url;
        self
    }

    pub fn with_failure_policy(mut self, policy: SourceFailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Collect every source, concatenate in source order and sort newest
    /// first.
    #[instrument(level = "info", skip_all, fields(sources = self.scrapers.len()))]
    pub async fn collect_all(&self) -> Result<Vec<NewsItem>, FeedError> {
        let results: Vec<(&SiteScraper, Result<Vec<NewsItem>, FeedError>)> = stream::iter(&self.scrapers)
            .map(|scraper| async move { (scraper, scraper.collect().await) })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut all = Vec::new();
        let mut failed = 0usize;
        for (scraper, result) in results {
            let url = &scraper.config().source_url;
            match result {
                Ok(items) => all.extend(items),
                Err(e) if e.is_source_failure() && self.on_failure == SourceFailurePolicy::Skip => {
                    failed += 1;
                    warn!(%url, error = %e, "Source failed; continuing without it");
                }
                Err(e) => {
                    error!(%url, error = %e, "Source failed; aborting aggregation");
                    return Err(e);
                }
            }
        }

        sort_newest_first(&mut all);
        info!(items = all.len(), failed, "Merged sources");
        Ok(all)
    }

    /// Combined channel metadata.
    pub fn metadata(&self) -> FeedMetadata {
        let link = self
            .link
            .clone()
            .or_else(|| self.scrapers.first().map(|s| s.config().source_url.clone()))
            .unwrap_or_default();
        let mut metadata = FeedMetadata::new(&self.title, &self.description, link);
        metadata.self_url = self.self_url.clone();
        metadata
    }

    /// Build the merged feed and write it to `output`.
    #[instrument(level = "info", skip_all, fields(path = %output.display()))]
    pub async fn build_feed(&self, items: Vec<NewsItem>, output: &Path) -> Result<(), FeedError> {
        let document = FeedDocument::new(self.metadata(), items);
        rss::write_document(&document, output).await
    }
}
