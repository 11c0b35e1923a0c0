//! Site scrapers: the [`Extractor`] trait and the [`SiteScraper`] that drives it.
//!
//! A scraper runs a fixed pipeline:
//!
//! 1. **Fetch**: GET the configured listing page
//! 2. **Extract**: hand the page to the site's [`Extractor`]
//! 3. **Validate**: turn candidates into [`NewsItem`]s under a [`ValidationPolicy`]
//!
//! # Supported Sites
//!
//! | Site | Extractor | Notes |
//! |------|-----------|-------|
//! | FIT@HCMUS | [`fit_hcmus::FitHcmusExtractor`] | `.post-content` cards, `dd/mm/YYYY` dates |
//! | any | [`selectors::SelectorExtractor`] | CSS selectors and date format from config |

pub mod fit_hcmus;
pub mod selectors;

use crate::errors::{ExtractionError, FeedError};
use crate::fetch::fetch_page;
use crate::models::{CandidateItem, FeedDocument, FeedMetadata, FetchedPage, NewsItem, ScraperConfig};
use crate::outputs::rss;
use crate::utils::collapse_whitespace;
use crate::validate::{ValidationPolicy, validate_batch};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::Client;
use scraper::ElementRef;
use std::path::Path;
use tracing::{debug, info, instrument};
use url::Url;

/// Site-specific knowledge of a listing page: selectors, date strings, links.
pub trait Extractor: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Extract candidate items from a fetched page.
    ///
    /// Fails when the page lacks the expected item structure, which usually
    /// means the site layout changed.
    fn extract(&self, page: &FetchedPage) -> Result<Vec<CandidateItem>, ExtractionError>;
}

/// One news source: a listing URL, its feed metadata and its extractor.
pub struct SiteScraper {
    config: ScraperConfig,
    extractor: Box<dyn Extractor>,
    client: Client,
    validation: ValidationPolicy,
}

impl SiteScraper {
    pub fn new(config: ScraperConfig, extractor: Box<dyn Extractor>, client: Client) -> Self {
        Self {
            config,
            extractor,
            client,
            validation: ValidationPolicy::default(),
        }
    }

    pub fn with_validation_policy(mut self, policy: ValidationPolicy) -> Self {
        self.validation = policy;
        self
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Fetch the listing page, extract and validate its items.
    #[instrument(level = "info", skip_all, fields(url = %self.config.source_url, extractor = self.extractor.name()))]
    pub async fn collect(&self) -> Result<Vec<NewsItem>, FeedError> {
        let page = fetch_page(&self.client, &self.config.source_url).await?;
        debug!(status = page.status, final_url = %page.url, "Handing page to extractor");
        let candidates = self.extractor.extract(&page)?;
        let extracted = candidates.len();
        let items = validate_batch(candidates, self.validation)?;
        info!(extracted, valid = items.len(), "Collected items");
        Ok(items)
    }

    /// Feed metadata for this source alone.
    pub fn metadata(&self) -> FeedMetadata {
        FeedMetadata::new(
            &self.config.feed_title,
            &self.config.feed_description,
            &self.config.source_url,
        )
    }

    /// Build this source's own feed and write it to `output`.
    #[instrument(level = "info", skip_all, fields(path = %output.display()))]
    pub async fn build_feed(&self, items: Vec<NewsItem>, output: &Path) -> Result<(), FeedError> {
        let document = FeedDocument::new(self.metadata(), items);
        rss::write_document(&document, output).await
    }
}

/// Visible text of an element with whitespace collapsed.
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Resolve `href` against the page URL; unresolvable values are returned as-is
/// so validation can report them.
pub(crate) fn resolve_link(base: &Url, href: &str) -> String {
    base.join(href.trim())
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}

/// Parse a listing date with a chrono format string.
///
/// Formats with a time component are read as UTC; date-only formats map to
/// UTC midnight.
pub(crate) fn parse_listing_date(raw: &str, format: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, format)
        .map(|dt| dt.and_utc())
        .or_else(|_| NaiveDate::parse_from_str(raw, format).map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc()))
        .ok()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FetchError;
    use crate::fetch::{DEFAULT_TIMEOUT, build_client};
    use crate::models::fixtures::day;
    use crate::outputs::rss::parse;
    use testing::{BrokenExtractor, StaticExtractor, ok_server};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn candidate(title: &str, link: &str, date: Option<DateTime<Utc>>) -> CandidateItem {
        CandidateItem {
            title: title.to_string(),
            link: link.to_string(),
            date,
        }
    }

    fn scraper(url: &str, extractor: Box<dyn Extractor>) -> SiteScraper {
        SiteScraper::new(
            ScraperConfig::new(url, "FIT News", "Unofficial RSS"),
            extractor,
            build_client(DEFAULT_TIMEOUT).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_collect_then_build_keeps_date_order() {
        let server = ok_server().await;
        let s = scraper(
            &server.uri(),
            Box::new(StaticExtractor(vec![
                candidate("A", "https://x/a", Some(day(2024, 1, 2))),
                candidate("B", "https://x/b", Some(day(2024, 1, 1))),
            ])),
        );

        let items = s.collect().await.unwrap();
        assert_eq!(items.len(), 2);

        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("feed.xml");
        s.build_feed(items, &out).await.unwrap();

        let doc = parse(&std::fs::read(&out).unwrap()).unwrap();
        let titles: Vec<_> = doc.items().iter().map(NewsItem::title).collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert_eq!(doc.metadata().title, "FIT News");
        assert_eq!(doc.metadata().link, server.uri());
    }

    #[tokio::test]
    async fn test_invalid_item_absent_from_feed() {
        let server = ok_server().await;
        let s = scraper(
            &server.uri(),
            Box::new(StaticExtractor(vec![
                candidate("", "https://x/empty", Some(day(2024, 1, 3))),
                candidate("Kept", "https://x/kept", Some(day(2024, 1, 2))),
            ])),
        );

        let items = s.collect().await.unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("feed.xml");
        s.build_feed(items, &out).await.unwrap();

        let doc = parse(&std::fs::read(&out).unwrap()).unwrap();
        assert_eq!(doc.items().len(), 1);
        assert_eq!(doc.items()[0].title(), "Kept");
    }

    #[tokio::test]
    async fn test_fail_policy_surfaces_validation_error() {
        let server = ok_server().await;
        let s = scraper(
            &server.uri(),
            Box::new(StaticExtractor(vec![candidate("No date", "https://x/a", None)])),
        )
        .with_validation_policy(ValidationPolicy::Fail);

        let err = s.collect().await.unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)));
    }

    #[tokio::test]
    async fn test_collect_surfaces_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let s = scraper(&server.uri(), Box::new(StaticExtractor(Vec::new())));

        let err = s.collect().await.unwrap_err();
        assert!(matches!(err, FeedError::Fetch(FetchError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_collect_surfaces_extraction_error() {
        let server = ok_server().await;
        let s = scraper(&server.uri(), Box::new(BrokenExtractor));

        let err = s.collect().await.unwrap_err();
        assert!(matches!(err, FeedError::Extraction(_)));
    }

    #[test]
    fn test_resolve_link() {
        let base = Url::parse("https://www.fit.hcmus.edu.vn/tin-tuc/c/thong-bao-chung").unwrap();
        assert_eq!(
            resolve_link(&base, "/tin-tuc/d/lich-thi"),
            "https://www.fit.hcmus.edu.vn/tin-tuc/d/lich-thi"
        );
        assert_eq!(resolve_link(&base, "https://other.org/a"), "https://other.org/a");
    }

    #[test]
    fn test_parse_listing_date() {
        assert_eq!(parse_listing_date(" 02/01/2024 ", "%d/%m/%Y"), Some(day(2024, 1, 2)));
        assert_eq!(
            parse_listing_date("2024-03-05 14:30", "%Y-%m-%d %H:%M").map(|d| d.to_rfc3339()),
            Some("2024-03-05T14:30:00+00:00".to_string())
        );
        assert_eq!(parse_listing_date("31/02/2024", "%d/%m/%Y"), None);
        assert_eq!(parse_listing_date("", "%d/%m/%Y"), None);
    }
}
