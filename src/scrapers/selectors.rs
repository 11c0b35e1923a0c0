//! Configurable CSS-selector extractor for listing pages without a dedicated
//! scraper.

use super::{Extractor, element_text, parse_listing_date, resolve_link};
use crate::errors::{ExtractionError, FeedError};
use crate::models::{CandidateItem, FetchedPage};
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, instrument};

/// Selector rules as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelectorRules {
    /// One match per article.
    pub item: String,
    /// Title text, relative to the item.
    pub title: String,
    /// Element carrying the link, relative to the item.
    pub link: String,
    #[serde(default = "default_link_attr")]
    pub link_attr: String,
    /// Date text, relative to the item.
    pub date: String,
    /// chrono format of the date text.
    pub date_format: String,
}

fn default_link_attr() -> String {
    "href".to_string()
}

pub struct SelectorExtractor {
    name: String,
    item: Selector,
    title: Selector,
    link: Selector,
    link_attr: String,
    date: Selector,
    date_format: String,
}

impl SelectorExtractor {
    /// Compile `rules`; invalid selectors are a config error.
    pub fn new(name: impl Into<String>, rules: &SelectorRules) -> Result<Self, FeedError> {
        let compile = |field: &str, css: &str| {
            Selector::parse(css).map_err(|e| FeedError::config(format!("invalid `{field}` selector {css:?}: {e}")))
        };

        Ok(Self {
            name: name.into(),
            item: compile("item", &rules.item)?,
            title: compile("title", &rules.title)?,
            link: compile("link", &rules.link)?,
            link_attr: rules.link_attr.clone(),
            date: compile("date", &rules.date)?,
            date_format: rules.date_format.clone(),
        })
    }
}

impl Extractor for SelectorExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(level = "debug", skip_all, fields(extractor = %self.name, url = %page.url))]
    fn extract(&self, page: &FetchedPage) -> Result<Vec<CandidateItem>, ExtractionError> {
        let document = Html::parse_document(&page.body);

        let items: Vec<CandidateItem> = document
            .select(&self.item)
            .map(|item| CandidateItem {
                title: item
                    .select(&self.title)
                    .next()
                    .map(|el| element_text(&el))
                    .unwrap_or_default(),
                link: item
                    .select(&self.link)
                    .next()
                    .and_then(|el| el.value().attr(&self.link_attr))
                    .map(|href| resolve_link(&page.url, href))
                    .unwrap_or_default(),
                date: item
                    .select(&self.date)
                    .next()
                    .and_then(|el| parse_listing_date(&element_text(&el), &self.date_format)),
            })
            .collect();

        if items.is_empty() {
            return Err(ExtractionError::new(
                &self.name,
                page.url.as_str(),
                "item selector matched nothing",
            ));
        }

        debug!(count = items.len(), "Extracted items");
        Ok(items)
    }
}
