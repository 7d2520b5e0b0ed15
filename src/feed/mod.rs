pub mod fetcher;
pub mod list;
pub mod parser;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use fetcher::FeedFetcher;
pub use list::FeedList;
pub use parser::FeedParser;

/// Canonical form of one item of a fetched feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub description: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub title: String,
    pub entries: Vec<FeedEntry>,
}

/// Anything that can turn a feed URL into entries.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_feed(&self, url: &str) -> Result<ParsedFeed>;
}

/// Anything that can return the markup of a linked page.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

impl FeedEntry {
    /// Calendar date of publication in UTC, time of day dropped.
    pub fn published_on(&self) -> Option<NaiveDate> {
        self.published.map(|published| published.date_naive())
    }

    /// Publication timestamp as stored alongside persisted documents.
    ///
    /// The feed's raw date text is not kept, so this is re-rendered as RFC 2822.
    pub fn published_string(&self) -> Option<String> {
        self.published.map(|published| published.to_rfc2822())
    }

    /// Tag data carried by the entry, `None` when the source had none.
    pub fn tags(&self) -> Option<&[String]> {
        if self.tags.is_empty() {
            None
        } else {
            Some(&self.tags)
        }
    }

    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}
