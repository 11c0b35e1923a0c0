//! Run configuration.
//!
//! Resolution order, lowest to highest precedence:
//!
//! 1. Built-in defaults: the merged FIT@HCMUS announcement feed
//! 2. A YAML file given with `--config`
//! 3. Individual CLI flags / environment variables
//!
//! # Example
//!
//! ```yaml
//! output: public/feed.xml
//! timeout_secs: 30
//! mode: merged
//! on_invalid_item: skip
//! on_source_failure: skip
//! feed:
//!   title: FIT@HCMUS News Feed
//!   description: Unofficial RSS for FIT@HCMUS news
//!   self_url: https://example.github.io/fit-feed/feed.xml
//! sources:
//!   - url: https://www.fit.hcmus.edu.vn/tin-tuc/c/thong-bao-chung
//!     title: FIT News
//!     description: Unofficial RSS for FIT@HCMUS category
//!   - url: https://news.example.edu/
//!     title: Example
//!     description: Example listing
//!     extractor:
//!       kind: selectors
//!       item: article.news
//!       title: h2
//!       link: a
//!       date: time
//!       date_format: "%Y-%m-%d"
//! ```

use crate::aggregator::{Aggregator, DEFAULT_CONCURRENCY, SourceFailurePolicy};
use crate::cli::Cli;
use crate::errors::FeedError;
use crate::fetch::DEFAULT_TIMEOUT;
use crate::models::ScraperConfig;
use crate::scrapers::fit_hcmus::{BASE_URL, CATEGORY_PATHS, FitHcmusExtractor};
use crate::scrapers::selectors::{SelectorExtractor, SelectorRules};
use crate::scrapers::{Extractor, SiteScraper};
use crate::validate::ValidationPolicy;
use clap::ValueEnum;
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

/// Whether to publish one source's own feed or the merged feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Exactly one source, published with its own title and description.
    Single,
    /// All sources merged under the combined feed metadata.
    #[default]
    Merged,
}

/// Which extractor a source uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractorSettings {
    #[default]
    FitHcmus,
    Selectors(SelectorRules),
}

impl ExtractorSettings {
    fn build(&self, source_url: &str) -> Result<Box<dyn Extractor>, FeedError> {
        Ok(match self {
            Self::FitHcmus => Box::new(FitHcmusExtractor),
            Self::Selectors(rules) => Box::new(SelectorExtractor::new(source_url, rules)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceSettings {
    pub url: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub extractor: ExtractorSettings,
}

/// Combined metadata for the merged feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub title: String,
    pub description: String,
    /// Channel link; the first source's URL when absent.
    pub link: Option<String>,
    /// Where the published feed will be served from.
    pub self_url: Option<String>,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            title: "FIT@HCMUS News Feed".to_string(),
            description: "Unofficial RSS for FIT@HCMUS news".to_string(),
            link: None,
            self_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub output: PathBuf,
    pub timeout_secs: u64,
    pub concurrency: usize,
    pub mode: Mode,
    pub on_invalid_item: ValidationPolicy,
    pub on_source_failure: SourceFailurePolicy,
    pub feed: FeedSettings,
    pub sources: Vec<SourceSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output: PathBuf::from("feed.xml"),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            concurrency: DEFAULT_CONCURRENCY,
            mode: Mode::default(),
            on_invalid_item: ValidationPolicy::default(),
            on_source_failure: SourceFailurePolicy::default(),
            feed: FeedSettings::default(),
            sources: CATEGORY_PATHS
                .iter()
                .map(|path| SourceSettings {
                    url: format!("{BASE_URL}{path}"),
                    title: "FIT News".to_string(),
                    description: "Unofficial RSS for FIT@HCMUS category".to_string(),
                    extractor: ExtractorSettings::FitHcmus,
                })
                .collect(),
        }
    }
}

impl Settings {
    /// Parse settings from YAML; missing keys keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, FeedError> {
        serde_yaml::from_str(yaml).map_err(|e| FeedError::config(format!("invalid settings: {e}")))
    }

    /// Load defaults, then the YAML file if one is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&Path>) -> Result<Self, FeedError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FeedError::io(path, e))?;
        let settings = Self::from_yaml(&yaml)?;
        info!(sources = settings.sources.len(), "Loaded settings file");
        Ok(settings)
    }

    /// Apply CLI flags on top of file/default values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(output) = &cli.output {
            self.output = output.clone();
        }
        if let Some(timeout) = cli.timeout_secs {
            self.timeout_secs = timeout;
        }
        if let Some(mode) = cli.mode {
            self.mode = mode;
        }
        if let Some(policy) = cli.on_invalid_item {
            self.on_invalid_item = policy;
        }
        if let Some(policy) = cli.on_source_failure {
            self.on_source_failure = policy;
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), FeedError> {
        if self.timeout_secs == 0 {
            return Err(FeedError::config("timeout_secs must be greater than zero"));
        }
        if self.mode == Mode::Single && self.sources.len() != 1 {
            return Err(FeedError::config(format!(
                "single mode needs exactly one source, {} configured",
                self.sources.len()
            )));
        }
        Ok(())
    }

    /// Instantiate one scraper per configured source.
    pub fn build_scrapers(&self, client: &Client) -> Result<Vec<SiteScraper>, FeedError> {
        self.sources
            .iter()
            .map(|source| {
                let extractor = source.extractor.build(&source.url)?;
                let config = ScraperConfig::new(&source.url, &source.title, &source.description);
                Ok(SiteScraper::new(config, extractor, client.clone()).with_validation_policy(self.on_invalid_item))
            })
            .collect()
    }

    /// Aggregator over all sources with the combined feed metadata.
    pub fn build_aggregator(&self, client: &Client) -> Result<Aggregator, FeedError> {
        Ok(
            Aggregator::new(self.build_scrapers(client)?, &self.feed.title, &self.feed.description)
                .with_link(self.feed.link.clone())
                .with_self_url(self.feed.self_url.clone())
                .with_failure_policy(self.on_source_failure)
                .with_concurrency(self.concurrency),
        )
    }
}
