//! Data models for scraped news and the feed built from it.
//!
//! - [`FetchedPage`]: raw HTTP response handed to an extractor
//! - [`CandidateItem`]: untrusted record produced by an extractor
//! - [`NewsItem`]: validated record; only [`crate::validate`] and the feed
//!   parser can construct one
//! - [`ScraperConfig`] / [`FeedMetadata`] / [`FeedDocument`]: feed-level data

use chrono::{DateTime, Utc};
use url::Url;

/// A listing page as returned by the fetcher.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects; used to resolve relative links.
    pub url: Url,
    pub status: u16,
    pub body: String,
}

/// An article record straight out of an extractor, before validation.
///
/// `date` is `None` when the site's date string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateItem {
    pub title: String,
    pub link: String,
    pub date: Option<DateTime<Utc>>,
}

/// A validated news item.
///
/// The title is non-empty, the link is absolute and the date is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsItem {
    title: String,
    link: Url,
    date: DateTime<Utc>,
}

impl NewsItem {
    /// Build an item from parts already checked by the caller.
    pub(crate) fn from_checked(title: String, link: Url, date: DateTime<Utc>) -> Self {
        Self { title, link, date }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn link(&self) -> &Url {
        &self.link
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }
}

/// Per-source configuration: where to scrape and how to title its own feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScraperConfig {
    pub source_url: String,
    pub feed_title: String,
    pub feed_description: String,
}

impl ScraperConfig {
    pub fn new(
        source_url: impl Into<String>,
        feed_title: impl Into<String>,
        feed_description: impl Into<String>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            feed_title: feed_title.into(),
            feed_description: feed_description.into(),
        }
    }
}

/// Channel-level metadata of a feed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMetadata {
    pub title: String,
    pub description: String,
    /// Channel link, usually the scraped listing page.
    pub link: String,
    /// Public URL the feed itself is served from, if known.
    pub self_url: Option<String>,
    pub generator: String,
    pub last_build: DateTime<Utc>,
}

impl FeedMetadata {
    /// Metadata stamped with the current time and this program as generator.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            link: link.into(),
            self_url: None,
            generator: concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")).to_string(),
            last_build: Utc::now(),
        }
    }
}

/// A feed ready to be serialized.
///
/// Items are kept newest first; equal dates keep their collection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedDocument {
    metadata: FeedMetadata,
    items: Vec<NewsItem>,
}

impl FeedDocument {
    pub fn new(metadata: FeedMetadata, mut items: Vec<NewsItem>) -> Self {
        sort_newest_first(&mut items);
        Self { metadata, items }
    }

    pub fn metadata(&self) -> &FeedMetadata {
        &self.metadata
    }

    pub fn items(&self) -> &[NewsItem] {
        &self.items
    }
}

/// Stable sort by date descending.
pub fn sort_newest_first(items: &mut [NewsItem]) {
    items.sort_by(|a, b| b.date.cmp(&a.date));
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    pub fn item(title: &str, link: &str, date: DateTime<Utc>) -> NewsItem {
        NewsItem::from_checked(title.to_string(), Url::parse(link).unwrap(), date)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{day, item};
    use super::*;

    #[test]
    fn test_document_sorts_newest_first() {
        let doc = FeedDocument::new(
            FeedMetadata::new("t", "d", "https://x"),
            vec![
                item("old", "https://x/old", day(2024, 1, 1)),
                item("new", "https://x/new", day(2024, 1, 3)),
                item("mid", "https://x/mid", day(2024, 1, 2)),
            ],
        );
        let titles: Vec<_> = doc.items().iter().map(NewsItem::title).collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_dates() {
        let mut items = vec![
            item("first", "https://x/1", day(2024, 2, 1)),
            item("second", "https://x/2", day(2024, 2, 1)),
            item("newer", "https://x/3", day(2024, 2, 2)),
            item("third", "https://x/4", day(2024, 2, 1)),
        ];
        sort_newest_first(&mut items);
        let titles: Vec<_> = items.iter().map(NewsItem::title).collect();
        assert_eq!(titles, vec!["newer", "first", "second", "third"]);
    }

    #[test]
    fn test_metadata_generator() {
        let meta = FeedMetadata::new("FIT News", "desc", "https://example.com");
        assert!(meta.generator.starts_with("news_feed "));
        assert_eq!(meta.link, "https://example.com");
    }
}
