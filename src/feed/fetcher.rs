use crate::config::Settings;
use crate::error::{Error, Result};
use crate::feed::parser::FeedParser;
use crate::feed::{FeedSource, PageSource, ParsedFeed};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

const FEED_ACCEPT: &str = "application/rss+xml, application/atom+xml, application/xml, text/xml, */*";
const PAGE_ACCEPT: &str = "text/html, application/xhtml+xml, */*";

/// HTTP client for feeds and the pages they link to.
///
/// Every request is bounded by `timeout_duration`; expiry surfaces as
/// `Error::Timeout` so callers can skip the feed or entry and move on.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
    timeout_duration: Duration,
    user_agent: String,
}

impl FeedFetcher {
    pub fn new() -> Result<Self> {
        Self::from_settings(&Settings::default())
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout_duration = Duration::from_secs(settings.timeout);
        let client = Client::builder()
            .timeout(timeout_duration)
            .redirect(reqwest::redirect::Policy::limited(settings.max_redirects))
            .gzip(true)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout_duration,
            user_agent: settings.user_agent.clone(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_duration = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    async fn get(&self, url: &str, accept: &str) -> Result<Response> {
        let parser = FeedParser::new();
        parser.validate_feed_url(url)?;

        let response = timeout(self.timeout_duration, self.fetch_response(url, accept))
            .await
            .map_err(|_| Error::Timeout(format!("Request to {} timed out", url)))??;

        if !response.status().is_success() {
            return Err(Error::HttpError(format!(
                "HTTP {} for {}: {}",
                response.status().as_u16(),
                url,
                response.status().canonical_reason().unwrap_or("Unknown error")
            )));
        }

        Ok(response)
    }

    async fn fetch_response(&self, url: &str, accept: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", accept)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("Request to {} timed out", url))
                } else {
                    Error::HttpError(format!("Request failed: {}", e))
                }
            })?;

        Ok(response)
    }

    async fn read_body<T, F>(&self, url: &str, body: F) -> Result<T>
    where
        F: std::future::Future<Output = reqwest::Result<T>>,
    {
        timeout(self.timeout_duration, body)
            .await
            .map_err(|_| Error::Timeout(format!("Reading body of {} timed out", url)))?
            .map_err(|e| Error::HttpError(format!("Failed to read response body: {}", e)))
    }
}

#[async_trait]
impl FeedSource for FeedFetcher {
    async fn fetch_feed(&self, url: &str) -> Result<ParsedFeed> {
        debug!("Fetching feed from: {}", url);

        let response = self.get(url, FEED_ACCEPT).await?;
        let content = self.read_body(url, response.bytes()).await?;

        debug!("Downloaded {} bytes from {}", content.len(), url);

        let cursor = std::io::Cursor::new(content);
        FeedParser::new().parse_feed(cursor)
    }
}

#[async_trait]
impl PageSource for FeedFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        debug!("Fetching page from: {}", url);

        let response = self.get(url, PAGE_ACCEPT).await?;
        let html = self.read_body(url, response.text()).await?;

        debug!("Downloaded {} bytes of markup from {}", html.len(), url);
        Ok(html)
    }
}
