//! FIT@HCMUS announcement scraper.
//!
//! Scrapes the category listings of the Faculty of Information Technology,
//! University of Science (VNU-HCM), e.g.
//! `https://www.fit.hcmus.edu.vn/tin-tuc/c/thong-bao-chung`.
//!
//! # Page Structure
//!
//! Each announcement is a `.post-content` card. Its first link holds the title
//! and a site-relative URL, and `li.post-date span` holds the date as
//! `dd/mm/YYYY`. Dates carry no time, so items are stamped at UTC midnight.

use super::{Extractor, element_text, parse_listing_date, resolve_link};
use crate::errors::ExtractionError;
use crate::models::{CandidateItem, FetchedPage};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, instrument};

pub const BASE_URL: &str = "https://www.fit.hcmus.edu.vn";

/// Announcement categories published on the FIT news pages.
pub const CATEGORY_PATHS: [&str; 8] = [
    "/tin-tuc/c/thong-bao-chung",
    "/tin-tuc/c/thong-bao-he-chinh-quy",
    "/tin-tuc/c/tot-nghiep-qui-trinh-thuc-hien",
    "/tin-tuc/c/thong-tin-hoc-bong",
    "/tin-tuc/c/thong-bao-sau-dai-hoc",
    "/tin-tuc/c/thong-bao-lien-thong-dh-ths",
    "/tin-tuc/c/lich-truc-co-van-hoc-tap",
    "/tin-tuc/c/thong-tin-tuyen-dung",
];

const DATE_FORMAT: &str = "%d/%m/%Y";

static POST: Lazy<Selector> = Lazy::new(|| Selector::parse(".post-content").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static POST_DATE: Lazy<Selector> = Lazy::new(|| Selector::parse("li.post-date span").unwrap());

#[derive(Debug, Default, Clone, Copy)]
pub struct FitHcmusExtractor;

impl Extractor for FitHcmusExtractor {
    fn name(&self) -> &str {
        "fit_hcmus"
    }

    #[instrument(level = "debug", skip_all, fields(url = %page.url))]
    fn extract(&self, page: &FetchedPage) -> Result<Vec<CandidateItem>, ExtractionError> {
        let document = Html::parse_document(&page.body);

        let mut items = Vec::new();
        for post in document.select(&POST) {
            let anchor = post.select(&ANCHOR).next();
            let title = anchor.as_ref().map(element_text).unwrap_or_default();
            let link = anchor
                .and_then(|a| a.value().attr("href"))
                .map(|href| resolve_link(&page.url, href))
                .unwrap_or_default();
            let date = post
                .select(&POST_DATE)
                .next()
                .and_then(|span| parse_listing_date(&element_text(&span), DATE_FORMAT));

            items.push(CandidateItem { title, link, date });
        }

        if items.is_empty() {
            return Err(ExtractionError::new(
                self.name(),
                page.url.as_str(),
                "no `.post-content` elements found",
            ));
        }

        debug!(count = items.len(), "Extracted FIT announcements");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeedMetadata;
    use crate::models::fixtures::day;
    use crate::outputs::rss::serialize;
    use crate::validate::{ValidationPolicy, validate_batch};
    use pretty_assertions::assert_eq;
    use url::Url;

    const LISTING: &str = r#"
        <html><body>
          <div class="post-list">
            <div class="post-content">
              <h3 class="post-title">
                <a href="/tin-tuc/d/thong-bao-lich-thi-hk1">
                  Thông báo lịch thi
                  học kỳ 1
                </a>
              </h3>
              <ul class="post-meta">
                <li class="post-date"><i class="fa fa-clock"></i> <span>02/01/2024</span></li>
              </ul>
            </div>
            <div class="post-content">
              <h3><a href="https://www.fit.hcmus.edu.vn/tin-tuc/d/hoc-bong">Học bổng &amp; tài trợ</a></h3>
              <ul class="post-meta"><li class="post-date"><span>28/12/2023</span></li></ul>
            </div>
            <div class="post-content">
              <h3><a href="/tin-tuc/d/khong-ngay">Không có ngày</a></h3>
            </div>
          </div>
        </body></html>
    "#;

    fn page(body: &str) -> FetchedPage {
        FetchedPage {
            url: Url::parse("https://www.fit.hcmus.edu.vn/tin-tuc/c/thong-bao-chung").unwrap(),
            status: 200,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_extracts_cards_in_page_order() {
        let items = FitHcmusExtractor.extract(&page(LISTING)).unwrap();

        assert_eq!(
            items,
            vec![
                CandidateItem {
                    title: "Thông báo lịch thi học kỳ 1".to_string(),
                    link: "https://www.fit.hcmus.edu.vn/tin-tuc/d/thong-bao-lich-thi-hk1".to_string(),
                    date: Some(day(2024, 1, 2)),
                },
                CandidateItem {
                    title: "Học bổng & tài trợ".to_string(),
                    link: "https://www.fit.hcmus.edu.vn/tin-tuc/d/hoc-bong".to_string(),
                    date: Some(day(2023, 12, 28)),
                },
                CandidateItem {
                    title: "Không có ngày".to_string(),
                    link: "https://www.fit.hcmus.edu.vn/tin-tuc/d/khong-ngay".to_string(),
                    date: None,
                },
            ]
        );
    }

    #[test]
    fn test_card_without_link_yields_empty_fields() {
        let body = r#"<div class="post-content"><p>Bảo trì hệ thống</p>
            <ul><li class="post-date"><span>05/03/2024</span></li></ul></div>"#;
        let items = FitHcmusExtractor.extract(&page(body)).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "");
        assert_eq!(items[0].link, "");
        assert_eq!(items[0].date, Some(day(2024, 3, 5)));
    }

    #[test]
    fn test_missing_cards_is_extraction_error() {
        let err = FitHcmusExtractor
            .extract(&page("<html><body><div class='new-layout'></div></body></html>"))
            .unwrap_err();

        assert_eq!(err.extractor, "fit_hcmus");
        assert!(err.url.ends_with("/thong-bao-chung"));
    }

    #[test]
    fn test_card_with_signed_year_is_skipped() {
        let body = r#"
            <div class="post-content"><a href="/tin-tuc/d/cu">Năm lạ</a>
              <ul><li class="post-date"><span>01/01/-5</span></li></ul></div>
            <div class="post-content"><a href="/tin-tuc/d/moi">Tin mới</a>
              <ul><li class="post-date"><span>05/03/2024</span></li></ul></div>"#;
        let candidates = FitHcmusExtractor.extract(&page(body)).unwrap();
        assert_eq!(candidates.len(), 2);

        let items = validate_batch(candidates, ValidationPolicy::Skip).unwrap();
        let titles: Vec<_> = items.iter().map(|i| i.title()).collect();
        assert_eq!(titles, vec!["Tin mới"]);

        let meta = FeedMetadata::new("FIT News", "Unofficial RSS", BASE_URL);
        assert!(serialize(&items, &meta).is_ok());
    }

    #[test]
    fn test_category_urls() {
        let urls: Vec<String> = CATEGORY_PATHS.iter().map(|p| format!("{BASE_URL}{p}")).collect();
        assert_eq!(urls.len(), 8);
        assert!(urls.iter().all(|u| Url::parse(u).is_ok()));
    }
}
