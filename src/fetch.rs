//! HTTP fetching of listing pages.
//!
//! Some university sites reject requests that do not look like they come from
//! a browser, so every request carries a Chromium-like header set.

use crate::errors::{FeedError, FetchError};
use crate::models::FetchedPage;
use reqwest::Client;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONNECTION, HeaderMap, HeaderName, HeaderValue, UPGRADE_INSECURE_REQUESTS,
    USER_AGENT,
};
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/139.0.0.0 Safari/537.36";
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,\
     image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("sec-ch-ua"),
        HeaderValue::from_static(r#""Chromium";v="139", "Not;A=Brand";v="99""#),
    );
    headers.insert(HeaderName::from_static("sec-ch-ua-mobile"), HeaderValue::from_static("?0"));
    headers.insert(
        HeaderName::from_static("sec-ch-ua-platform"),
        HeaderValue::from_static(r#""Windows""#),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}

/// Build the shared HTTP client with browser headers and a request timeout.
pub fn build_client(timeout: Duration) -> Result<Client, FeedError> {
    Client::builder()
        .default_headers(browser_headers())
        .timeout(timeout)
        .build()
        .map_err(|e| FeedError::config(format!("cannot build HTTP client: {e}")))
}

/// GET `url` and return the page body.
///
/// Any non-2xx status is an error; there is no retry.
#[instrument(level = "info", skip(client))]
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage, FetchError> {
    let transport = |source| FetchError::Transport {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().await.map_err(transport)?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let final_url = response.url().clone();
    let body = response.text().await.map_err(transport)?;
    debug!(status = status.as_u16(), bytes = body.len(), "Fetched page");

    Ok(FetchedPage {
        url: final_url,
        status: status.as_u16(),
        body,
    })
}
