use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::feed::{FeedList, FeedSource};
use crate::filter::terms::TermSet;

/// Tags that feeds emit for media renditions rather than topics.
pub const NOISE_TAGS: [&str; 4] = ["thumbnail", "large", "medium", "full"];

/// A tag is selected once it has been seen more than this many times.
pub const DEFAULT_MIN_OCCURRENCES: usize = 3;

/// Occurrence count per lower-cased tag across a corpus.
#[derive(Debug, Default, Clone)]
pub struct TagFrequencyTable {
    counts: HashMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

impl TagFrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, tag: &str) {
        *self.counts.entry(tag.to_lowercase()).or_insert(0) += 1;
    }

    pub fn count(&self, tag: &str) -> usize {
        self.counts.get(tag).copied().unwrap_or(0)
    }

    /// Drop the known noise tags; absent keys are ignored.
    pub fn remove_noise(&mut self) {
        for tag in NOISE_TAGS {
            self.counts.remove(tag);
        }
    }

    /// Tags ordered by count, then tag, both descending.
    pub fn ranked(&self) -> Vec<TagCount> {
        let mut ranked: Vec<TagCount> = self
            .counts
            .iter()
            .map(|(tag, &count)| TagCount { tag: tag.clone(), count })
            .collect();

        ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| b.tag.cmp(&a.tag)));
        ranked
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Ranked result of a derivation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmartTerms {
    pub ranked: Vec<TagCount>,
    pub feeds_scanned: usize,
    pub feeds_skipped: usize,
}

impl SmartTerms {
    pub fn term_set(&self) -> TermSet {
        TermSet::from_literal_terms(self.ranked.iter().map(|t| t.tag.clone()))
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.ranked.iter().map(|t| t.tag.as_str())
    }
}

/// Derives an implicit term set from tag frequency over a feed list.
pub struct SmartTermDeriver<'a, S: FeedSource + ?Sized> {
    source: &'a S,
    min_occurrences: usize,
}

impl<'a, S: FeedSource + ?Sized> SmartTermDeriver<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            min_occurrences: DEFAULT_MIN_OCCURRENCES,
        }
    }

    pub fn with_min_occurrences(mut self, min_occurrences: usize) -> Self {
        self.min_occurrences = min_occurrences;
        self
    }

    /// Scan every feed in order and return the frequent tags.
    ///
    /// Feeds that fail to fetch are logged and skipped. If nothing could
    /// be scanned the result is empty and matches no entry.
    pub async fn derive(&self, feeds: &FeedList) -> SmartTerms {
        let mut table = TagFrequencyTable::new();
        let mut result = SmartTerms::default();

        for url in feeds.urls() {
            match self.source.fetch_feed(url).await {
                Ok(feed) => {
                    result.feeds_scanned += 1;
                    for entry in &feed.entries {
                        for tag in &entry.tags {
                            table.record(tag);
                        }
                    }
                    debug!(feed = %url, entries = feed.entries.len(), "Tallied tags");
                }
                Err(e) => {
                    result.feeds_skipped += 1;
                    warn!(feed = %url, code = e.error_code(), "Skipping feed during smart-term pass: {}", e);
                }
            }
        }

        table.remove_noise();

        result.ranked = table
            .ranked()
            .into_iter()
            .filter(|t| t.count > self.min_occurrences)
            .collect();

        info!(
            distinct_tags = table.len(),
            selected = result.ranked.len(),
            "Derived smart terms"
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::feed::{FeedEntry, ParsedFeed};
    use crate::filter::terms::{matches_tags, TagMatch};
    use async_trait::async_trait;

    struct StaticSource {
        feeds: HashMap<String, Vec<Vec<&'static str>>>,
    }

    #[async_trait]
    impl FeedSource for StaticSource {
        async fn fetch_feed(&self, url: &str) -> Result<ParsedFeed> {
            let entries = self
                .feeds
                .get(url)
                .ok_or_else(|| Error::HttpError(format!("HTTP 404 for {}", url)))?;

            Ok(ParsedFeed {
                title: url.to_string(),
                entries: entries
                    .iter()
                    .map(|tags| FeedEntry {
                        title: "entry".to_string(),
                        link: format!("{}/entry", url),
                        description: None,
                        published: None,
                        tags: tags.iter().map(|t| t.to_string()).collect(),
                    })
                    .collect(),
            })
        }
    }

    fn source(feeds: Vec<(&str, Vec<Vec<&'static str>>)>) -> StaticSource {
        StaticSource {
            feeds: feeds.into_iter().map(|(url, e)| (url.to_string(), e)).collect(),
        }
    }

    #[test]
    fn test_table_counts_case_insensitively() {
        let mut table = TagFrequencyTable::new();
        table.record("Rust");
        table.record("rust");
        table.record("RUST");

        assert_eq!(table.count("rust"), 3);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_remove_noise_tolerates_missing_keys() {
        let mut table = TagFrequencyTable::new();
        table.record("large");
        table.record("security");

        table.remove_noise();
        assert_eq!(table.count("large"), 0);
        assert_eq!(table.count("security"), 1);

        let mut empty = TagFrequencyTable::new();
        empty.remove_noise();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_ranked_order() {
        let mut table = TagFrequencyTable::new();
        for tag in ["b", "b", "a", "a", "c", "c", "c"] {
            table.record(tag);
        }

        let ranked: Vec<_> = table.ranked().into_iter().map(|t| (t.tag, t.count)).collect();
        assert_eq!(
            ranked,
            vec![("c".to_string(), 3), ("b".to_string(), 2), ("a".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn test_derive_selects_frequent_tags() {
        let source = source(vec![
            (
                "https://one.example/rss",
                vec![
                    vec!["Security", "thumbnail"],
                    vec!["security", "AI"],
                    vec!["Security", "large", "AI"],
                ],
            ),
            (
                "https://two.example/rss",
                vec![
                    vec!["security", "AI", "thumbnail"],
                    vec!["ai", "cloud", "thumbnail", "thumbnail"],
                ],
            ),
        ]);
        let feeds: FeedList = ["https://one.example/rss", "https://two.example/rss"]
            .into_iter()
            .collect();

        let terms = SmartTermDeriver::new(&source).derive(&feeds).await;

        assert_eq!(terms.tags().collect::<Vec<_>>(), vec!["security", "ai"]);
        assert_eq!(terms.ranked[0].count, 4);
        assert_eq!(terms.feeds_scanned, 2);

        let set = terms.term_set();
        assert!(!set.is_match_all());
        assert!(set.contains("security"));
        assert!(!set.contains("thumbnail"));
        assert!(!set.contains("cloud"));
    }

    #[tokio::test]
    async fn test_derive_skips_failed_feeds() {
        let source = source(vec![(
            "https://ok.example/rss",
            vec![vec!["linux"], vec!["linux"], vec!["linux"], vec!["linux"]],
        )]);
        let feeds: FeedList = ["https://down.example/rss", "https://ok.example/rss"]
            .into_iter()
            .collect();

        let terms = SmartTermDeriver::new(&source).derive(&feeds).await;

        assert_eq!(terms.feeds_skipped, 1);
        assert_eq!(terms.tags().collect::<Vec<_>>(), vec!["linux"]);
    }

    #[tokio::test]
    async fn test_derive_with_nothing_fetched_is_empty() {
        let source = source(vec![]);
        let feeds: FeedList = ["https://down.example/rss"].into_iter().collect();

        let terms = SmartTermDeriver::new(&source).derive(&feeds).await;
        let set = terms.term_set();

        assert!(set.is_empty());
        assert!(!set.is_match_all());
    }

    #[tokio::test]
    async fn test_derive_is_deterministic() {
        let corpus = vec![(
            "https://one.example/rss",
            vec![vec!["b", "a"], vec!["a", "b"], vec!["b", "a"], vec!["a", "b"], vec!["c"]],
        )];
        let feeds: FeedList = ["https://one.example/rss"].into_iter().collect();

        let first = SmartTermDeriver::new(&source(corpus.clone())).derive(&feeds).await;
        let second = SmartTermDeriver::new(&source(corpus)).derive(&feeds).await;

        assert_eq!(first, second);
        assert_eq!(first.tags().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_default_threshold_boundary() {
        let source = source(vec![(
            "https://one.example/rss",
            vec![
                vec!["three", "four"],
                vec!["three", "four"],
                vec!["three", "four"],
                vec!["four"],
            ],
        )]);
        let feeds: FeedList = ["https://one.example/rss"].into_iter().collect();

        let terms = SmartTermDeriver::new(&source).derive(&feeds).await;

        assert_eq!(terms.tags().collect::<Vec<_>>(), vec!["four"]);
        assert_eq!(terms.ranked[0].count, 4);
        assert!(!terms.term_set().contains("three"));
    }

    #[tokio::test]
    async fn test_star_tag_is_not_a_wildcard() {
        let source = source(vec![(
            "https://one.example/rss",
            vec![vec!["*"], vec!["*"], vec!["*"], vec!["*"], vec!["*"]],
        )]);
        let feeds: FeedList = ["https://one.example/rss"].into_iter().collect();

        let terms = SmartTermDeriver::new(&source).derive(&feeds).await;
        assert_eq!(terms.tags().collect::<Vec<_>>(), vec!["*"]);

        let set = terms.term_set();
        assert!(!set.is_match_all());
        assert!(set.contains("*"));
        assert_eq!(matches_tags(Some(&["rust".to_string()][..]), &set), TagMatch::NoMatch);
    }

    #[tokio::test]
    async fn test_custom_threshold() {
        let source = source(vec![("https://one.example/rss", vec![vec!["rare"]])]);
        let feeds: FeedList = ["https://one.example/rss"].into_iter().collect();

        let terms = SmartTermDeriver::new(&source)
            .with_min_occurrences(0)
            .derive(&feeds)
            .await;

        assert_eq!(terms.tags().collect::<Vec<_>>(), vec!["rare"]);
    }
}
