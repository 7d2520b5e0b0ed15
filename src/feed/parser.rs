use crate::feed::{FeedEntry, ParsedFeed};
use crate::error::{Error, Result};
use feed_rs::model::Entry;
use feed_rs::parser as feed_parser;
use std::io::BufRead;

pub struct FeedParser;

impl Default for FeedParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_feed<R: BufRead>(&self, reader: R) -> Result<ParsedFeed> {
        let feed = feed_parser::parse(reader)
            .map_err(|e| Error::FeedParse(format!("Failed to parse feed: {}", e)))?;

        let title = feed.title.map(|t| t.content).unwrap_or_else(|| "Untitled Feed".to_string());
        let entries = feed.entries.into_iter().map(Self::adapt_entry).collect();

        Ok(ParsedFeed { title, entries })
    }

    /// Normalize a feed-rs entry into a `FeedEntry`.
    ///
    /// The description prefers the summary and falls back to the content
    /// body. The publish time prefers `published` over `updated`.
    fn adapt_entry(entry: Entry) -> FeedEntry {
        let title = entry.title.map(|t| t.content).unwrap_or_else(|| "Untitled".to_string());
        let link = entry.links.first().map(|l| l.href.clone()).unwrap_or_default();
        let description = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body));
        let published = entry.published.or(entry.updated);
        let tags = entry.categories.into_iter().map(|c| c.term).collect();

        FeedEntry {
            title,
            link,
            description,
            published,
            tags,
        }
    }

    pub fn validate_feed_url(&self, url: &str) -> Result<()> {
        let parsed_url = url::Url::parse(url)
            .map_err(|e| Error::InvalidUrl(format!("Invalid URL: {}", e)))?;

        match parsed_url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(Error::InvalidUrl(format!("Unsupported scheme: {}", scheme))),
        }
    }
}
